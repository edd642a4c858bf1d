// Identity module - Participant addresses, keypairs and external references

mod address;
mod keypair;
mod reference;

pub use address::{Address, AddressError};
pub use keypair::{Keypair, KeypairError};
pub use reference::{ExternalRef, ExternalRefError};
