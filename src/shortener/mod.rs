//! Short-code allocation: generation, destination policy, and the bounded
//! collision-retry protocol that ties them to the store.

pub mod allocator;
pub mod code;
pub mod retry;
pub mod validator;

pub use allocator::{allocate, allocate_with, AllocationError, MAX_ALLOCATION_ATTEMPTS, RESERVED_CODES};
pub use code::{generate_code, generate_code_with, ALPHABET, CODE_LENGTH};
pub use retry::{retry, RetryError};
pub use validator::{is_valid, validate, UrlRejection};
