use std::sync::Arc;

// --- Module Structure ---

// Session guarding (route access decisions).
pub mod config;
pub mod guard;
pub mod roles;
pub mod session;
pub mod storage;

// Backend access (route fallbacks and envelope normalisation).
pub mod envelope;
pub mod error;
pub mod gateway;
pub mod resolver;

// Typed operations built on top of the resolver.
pub mod api;
pub mod auth;
pub mod bindings;
pub mod models;

// --- Public Re-exports ---

pub use api::{CompaniesApi, ProfileApi, ResumeApi, UsersApi, VacanciesApi};
pub use auth::AuthApi;
pub use bindings::{CompanyAssets, HrCompanyBindings, HrVacancyBindings};
pub use config::{ClientConfig, Env};
pub use error::{ApiError, StoreError};
pub use gateway::{
    ApiRequest, FormFile, HttpGateway, Method, ScriptedTransport, Transport, TransportState,
};
pub use guard::{Decision, NavigationRequest, RouteTable, SessionGuard};
pub use resolver::{CandidateList, EndpointResolver};
pub use session::{Session, SessionProvider, SessionState, StoredSession};
pub use storage::{KeyValueStore, MemoryStore, StoreState};

/// JobBoardClient
///
/// The single shared container holding every client service: one store, one
/// session view over it, one resolver, the guard and the typed facades. Cheap
/// to clone; all clones share the same state.
#[derive(Clone)]
pub struct JobBoardClient {
    pub config: ClientConfig,
    pub store: StoreState,
    pub sessions: SessionState,
    pub resolver: EndpointResolver,
    pub guard: SessionGuard,
    pub routes: Arc<RouteTable>,

    pub auth: AuthApi,
    pub vacancies: VacanciesApi,
    pub companies: CompaniesApi,
    pub users: UsersApi,
    pub resume: ResumeApi,
    pub profile: ProfileApi,

    pub hr_companies: HrCompanyBindings,
    pub hr_vacancies: HrVacancyBindings,
    pub company_assets: CompanyAssets,
}

impl JobBoardClient {
    /// Wires the client over an explicit transport and store.
    pub fn new(config: ClientConfig, transport: TransportState, store: StoreState) -> Self {
        let sessions: SessionState = Arc::new(StoredSession::new(store.clone()));
        let resolver = EndpointResolver::new(transport, sessions.clone());
        let guard = SessionGuard::new(config.roles.clone(), config.paths.clone());

        Self {
            auth: AuthApi::new(resolver.clone(), store.clone(), guard.clone()),
            vacancies: VacanciesApi::new(resolver.clone()),
            companies: CompaniesApi::new(resolver.clone()),
            users: UsersApi::new(resolver.clone()),
            resume: ResumeApi::new(resolver.clone()),
            profile: ProfileApi::new(resolver.clone()),
            hr_companies: HrCompanyBindings::new(store.clone()),
            hr_vacancies: HrVacancyBindings::new(store.clone()),
            company_assets: CompanyAssets::new(store.clone()),
            routes: Arc::new(RouteTable::mospolyjob(&config.roles)),
            config,
            store,
            sessions,
            resolver,
            guard,
        }
    }

    /// Production wiring: HTTP gateway from `config` and a fresh in-memory store.
    pub fn connect(config: ClientConfig) -> Result<Self, ApiError> {
        let transport: TransportState = Arc::new(HttpGateway::new(&config)?);
        let store: StoreState = Arc::new(MemoryStore::new());
        Ok(Self::new(config, transport, store))
    }

    /// Guard decision for navigating to `path`. Paths outside the route table
    /// are public.
    pub fn navigate(&self, path: &str) -> Decision {
        match self.routes.request_for(path) {
            Some(request) => self.guard.evaluate(self.sessions.as_ref(), &request),
            None => Decision::Allow,
        }
    }
}
