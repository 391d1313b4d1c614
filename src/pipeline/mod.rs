//! Pipeline stages for one conversion.
//!
//! ```text
//! verify ──▶ render ──▶ postprocess (decorator) ──▶ transfer ──▶ postprocess
//! (sha256)   (gs)       (working file)               (move)       (destinations)
//! ```
//!
//! 1. [`verify`]      check the source against a recorded SHA-256
//! 2. [`render`]      the [`render::Engine`] seam and the Ghostscript process
//! 3. [`transfer`]    private workspace allocation and result naming
//! 4. [`postprocess`] caller hooks around the transfer
//!
//! [`crate::facade::Facade`] strings the stages together.

pub mod postprocess;
pub mod render;
pub mod transfer;
pub mod verify;
