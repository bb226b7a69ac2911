//! Service creation.

use ratings_store::{NewService, Service, ServiceStore};
use ratings_types::WalletAddress;

use crate::CreateServiceError;

/// Who may add services.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AdminPolicy {
    /// Anyone may add services.
    #[default]
    Open,
    /// Only the listed wallet addresses may add services.
    AllowList(Vec<WalletAddress>),
}

impl AdminPolicy {
    /// An empty list means [`AdminPolicy::Open`].
    pub fn from_addresses(addresses: Vec<WalletAddress>) -> Self {
        if addresses.is_empty() {
            Self::Open
        } else {
            Self::AllowList(addresses)
        }
    }

    pub fn permits(&self, requester: Option<&WalletAddress>) -> bool {
        match self {
            Self::Open => true,
            Self::AllowList(allowed) => requester.is_some_and(|r| allowed.contains(r)),
        }
    }
}

/// Create a service with an empty aggregate.
///
/// `name` and `url` are trimmed and must not be blank. A blank description
/// is stored as `None`.
pub fn create_service<S>(
    store: &S,
    request: &NewService,
    requester: Option<&WalletAddress>,
    policy: &AdminPolicy,
) -> Result<Service, CreateServiceError>
where
    S: ServiceStore + ?Sized,
{
    let name = request.name.trim();
    if name.is_empty() {
        return Err(CreateServiceError::MissingField("name"));
    }
    let url = request.url.trim();
    if url.is_empty() {
        return Err(CreateServiceError::MissingField("url"));
    }

    match policy {
        AdminPolicy::Open => {
            tracing::warn!(
                requester = ?requester.map(WalletAddress::as_str),
                "service creation is open to anyone; set admin_addresses to restrict it"
            );
        }
        AdminPolicy::AllowList(_) if !policy.permits(requester) => {
            tracing::warn!(
                requester = ?requester.map(WalletAddress::as_str),
                "service creation refused"
            );
            return Err(CreateServiceError::Unauthorized(requester.cloned()));
        }
        AdminPolicy::AllowList(_) => {}
    }

    let description = request
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    let service = store.insert_service(&NewService {
        name: name.to_string(),
        url: url.to_string(),
        description,
    })?;
    tracing::info!(service_id = %service.id, name = %service.name, "service created");
    Ok(service)
}
