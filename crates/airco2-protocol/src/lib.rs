pub mod cipher;
pub mod frame;
pub mod validation;

pub use cipher::{decrypt, encrypt};
pub use frame::RawFrame;
pub use validation::{check_clear, check_decrypted, validate_clear, validate_decrypted};
