//! # Insight Policy
//!
//! The policy layer gating every response:
//! - PII detection and masking over tldr, insights and evidence snippets
//! - Response envelope validation (lengths, evidence-required, domain trust)
//! - Command-specific result shape validation
//! - Evidence sanitization with trust-weighted confidence scoring
//!
//! Validation is pure: the same input always produces the same verdict.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod domains;
pub mod pii;
pub mod sanitize;
pub mod validator;

pub use domains::DomainPolicy;
pub use pii::{contains_pii, detect_pii_kinds, mask_pii, PiiKind};
pub use sanitize::{confidence_multiplier, sanitize_evidence, EvidenceSanitizer};
pub use validator::{PolicyValidator, PolicyViolation};
