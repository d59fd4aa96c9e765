//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Record Store Ports
//!
//! - `TenantRepository` - Tenant reads and field-level merge writes
//! - `SubscriptionRepository` - Subscription records per tenant
//! - `PlanReader` - Plan lookup
//! - `TrialConfigStore` - Trial configuration per scope
//!
//! ## Collaborator Ports
//!
//! - `IdentityProvider` - Current session, session changes, termination
//! - `HandoffStore` - Denial reason carried across the redirect
//! - `TrialNotifier` - Receives decided trial notices
//! - `EventPublisher` - Audit events
//! - `Clock` - Current instant

mod clock;
mod event_publisher;
mod handoff_store;
mod identity_provider;
mod plan_reader;
mod subscription_repository;
mod tenant_repository;
mod trial_config_store;
mod trial_notifier;

pub use clock::Clock;
pub use event_publisher::EventPublisher;
pub use handoff_store::{handoff_key, HandoffStore, HANDOFF_KEY};
pub use identity_provider::{IdentityProvider, IdentitySession, SessionChange};
pub use plan_reader::PlanReader;
pub use subscription_repository::SubscriptionRepository;
pub use tenant_repository::TenantRepository;
pub use trial_config_store::TrialConfigStore;
pub use trial_notifier::TrialNotifier;
