//! # Vessel Identification Client Core
//!
//! Query construction, validation, submission and result normalization
//! between the observation form and the remote classification service.
//!
//! **Data flow:**
//! field catalog → form session (builder, validation, autocomplete)
//! → submission pipeline → (classification service | offline report)
//! → result normalizer → display model
//!
//! # Example
//!
//! ```rust
//! use vesselid_common::{FormConfig, FormVariant};
//! use vesselid_ui::session::FormSession;
//!
//! let mut session = FormSession::new(FormConfig::for_variant(FormVariant::Flat));
//! session.update("length_metres_min", "200").unwrap();
//! session.update("length_metres_max", "100").unwrap();
//! session.settle();
//! assert_eq!(session.errors().get("length_metres_max"), Some("Max cannot be less than Min"));
//! ```

pub mod autocomplete;
pub mod client;
pub mod export;
pub mod form;
pub mod normalizer;
pub mod pipeline;
pub mod report;
pub mod scheduler;
pub mod session;
pub mod validation;

pub use client::{ClassificationClient, ClassificationService, ClassifyResponse, ClientError};
pub use form::{FieldValue, QueryBuilder, QueryForm, SubmissionPayload};
pub use normalizer::{Assessment, Band, ClassificationResult, DisplayMatch, Normalizer, ResultSource};
pub use pipeline::{FallbackPolicy, SubmissionPipeline, SubmissionState, SubmitError};
pub use session::FormSession;
