//! Integration tests for dirpush-drive
//!
//! Uses wiremock to simulate the Drive v2 API and verifies end-to-end
//! behavior of listing, folder creation, uploads, relocation, and
//! governor accounting.

mod common;

mod test_listing;
mod test_mutations;
mod test_upload;
