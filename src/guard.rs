use std::collections::BTreeSet;

use crate::{
    config::GuardPaths,
    roles::{Role, RoleTaxonomy},
    session::{Session, SessionProvider},
};

/// Landing page of student accounts.
pub const STUDENT_PROFILE_PATH: &str = "/profile";
/// Landing page of employer/HR accounts.
pub const HR_PROFILE_PATH: &str = "/hr-profile";

/// NavigationRequest
///
/// One route evaluation: where the viewer wants to go and which roles may see it.
/// `required_roles: None` means any authenticated session.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationRequest {
    pub target_path: String,
    pub required_roles: Option<BTreeSet<Role>>,
}

impl NavigationRequest {
    pub fn to(target_path: impl Into<String>) -> Self {
        Self {
            target_path: target_path.into(),
            required_roles: None,
        }
    }

    pub fn requiring<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.required_roles = Some(roles.into_iter().map(Role::new).collect());
        self
    }
}

/// Decision
///
/// Outcome of a guard evaluation. The caller performs the navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Redirect(String),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// SessionGuard
///
/// Gates navigation on the ambient session: no token goes to the login screen,
/// a pinned role is kept inside its subtree, and a role mismatch goes home.
#[derive(Debug, Clone)]
pub struct SessionGuard {
    taxonomy: RoleTaxonomy,
    paths: GuardPaths,
}

impl SessionGuard {
    pub fn new(taxonomy: RoleTaxonomy, paths: GuardPaths) -> Self {
        Self { taxonomy, paths }
    }

    pub fn taxonomy(&self) -> &RoleTaxonomy {
        &self.taxonomy
    }

    /// decide
    ///
    /// Pure decision for `request` under `session`:
    /// 1. no token: redirect to the auth screen;
    /// 2. the stored role is normalised (malformed means no role);
    /// 3. a pinned role outside its subtree: redirect to the role's home;
    /// 4. required roles not satisfied: redirect to `/`;
    /// 5. otherwise allow.
    pub fn decide(&self, session: &Session, request: &NavigationRequest) -> Decision {
        if !session.is_authenticated() {
            tracing::debug!(target_path = %request.target_path, "no token, sending to auth");
            return Decision::Redirect(self.paths.auth.clone());
        }

        let role = self.taxonomy.normalize(session.role.as_deref());

        if let Some(home) = role.as_ref().and_then(|r| self.taxonomy.pinned_home(r)) {
            if !within_subtree(&request.target_path, home) {
                tracing::debug!(
                    target_path = %request.target_path,
                    home,
                    "pinned role outside its subtree"
                );
                return Decision::Redirect(home.to_string());
            }
        }

        if let Some(required) = &request.required_roles {
            let permitted = role.as_ref().is_some_and(|r| required.contains(r));
            if !permitted {
                tracing::debug!(
                    target_path = %request.target_path,
                    role = role.as_ref().map(Role::as_str).unwrap_or("none"),
                    "role not permitted"
                );
                return Decision::Redirect(self.paths.home.clone());
            }
        }

        Decision::Allow
    }

    /// Reads the ambient session from `sessions` and decides.
    pub fn evaluate(
        &self,
        sessions: &dyn SessionProvider,
        request: &NavigationRequest,
    ) -> Decision {
        self.decide(&sessions.get(), request)
    }

    /// landing_path
    ///
    /// Where a freshly signed-in viewer is sent: a pinned role to its home,
    /// employers to the HR profile, everyone else to the student profile.
    pub fn landing_path(&self, session: &Session) -> String {
        let role = self.taxonomy.normalize(session.role.as_deref());
        if let Some(home) = role.as_ref().and_then(|r| self.taxonomy.pinned_home(r)) {
            return home.to_string();
        }
        if role.is_some() && role == self.taxonomy.employer() {
            return HR_PROFILE_PATH.to_string();
        }
        STUDENT_PROFILE_PATH.to_string()
    }
}

fn strip_path(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let path = &path[..end];
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

/// True when `target` is `home` itself or one of its children. Query strings,
/// fragments and trailing slashes are ignored.
fn within_subtree(target: &str, home: &str) -> bool {
    let target = strip_path(target);
    let home = strip_path(home);
    if home == "/" {
        return true;
    }
    target == home
        || target
            .strip_prefix(home)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// RouteEntry
///
/// One protected route of the application route map.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteEntry {
    pub path: String,
    /// `None`: any signed-in viewer. `Some`: only these roles.
    pub roles: Option<BTreeSet<Role>>,
    /// Whether children of `path` share the entry.
    pub prefix: bool,
}

/// RouteTable
///
/// The application's route map: which paths are public and which roles each
/// protected path admits. Unlisted paths are public.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// mospolyjob
    ///
    /// The MospolyJob route map with its role requirements drawn from
    /// `taxonomy`, matching where `SessionGuard::landing_path` sends each role:
    /// the employer tag owns the HR profile, every pinned role owns its home,
    /// and the remaining recognised roles own the student profile. A landing
    /// page whose role the taxonomy lacks admits nobody.
    pub fn mospolyjob(taxonomy: &RoleTaxonomy) -> Self {
        let employer = taxonomy.employer();
        let pinned: BTreeSet<&Role> = taxonomy.pinned().iter().map(|pin| &pin.role).collect();
        let students = taxonomy
            .recognized()
            .filter(|role| Some(*role) != employer.as_ref() && !pinned.contains(role))
            .cloned();

        let mut table = Self::new()
            .admit(STUDENT_PROFILE_PATH, students)
            .admit(HR_PROFILE_PATH, employer.clone());
        for pin in taxonomy.pinned() {
            table = table.admit(&pin.home, [pin.role.clone()]);
        }

        table
            .protect("/vacancies", None, true)
            .protect("/companies", None, true)
            .protect("/users", None, true)
    }

    pub fn protect(self, path: &str, roles: Option<&[&str]>, prefix: bool) -> Self {
        let roles = roles.map(|tags| tags.iter().map(Role::new).collect());
        self.push(path, roles, prefix)
    }

    /// Protects the subtree at `path` for exactly `roles`.
    pub fn admit(self, path: &str, roles: impl IntoIterator<Item = Role>) -> Self {
        self.push(path, Some(roles.into_iter().collect()), true)
    }

    fn push(mut self, path: &str, roles: Option<BTreeSet<Role>>, prefix: bool) -> Self {
        self.entries.push(RouteEntry {
            path: strip_path(path).to_string(),
            roles,
            prefix,
        });
        self
    }

    /// request_for
    ///
    /// The guard request for `path`, or `None` when the path is public.
    /// The longest matching entry wins.
    pub fn request_for(&self, path: &str) -> Option<NavigationRequest> {
        let stripped = strip_path(path);
        let entry = self
            .entries
            .iter()
            .filter(|entry| {
                if entry.prefix {
                    within_subtree(stripped, &entry.path)
                } else {
                    stripped == entry.path
                }
            })
            .max_by_key(|entry| entry.path.len())?;

        Some(NavigationRequest {
            target_path: path.to_string(),
            required_roles: entry.roles.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::{ROLE_COMPANY_OWNER, ROLE_EMPLOYER, ROLE_HR, ROLE_STUDENT};

    fn guard() -> SessionGuard {
        SessionGuard::new(RoleTaxonomy::latest(), GuardPaths::default())
    }

    fn redirect(path: &str) -> Decision {
        Decision::Redirect(path.to_string())
    }

    #[test]
    fn no_token_always_goes_to_auth() {
        let guard = guard();
        let anonymous = Session::anonymous();
        let blank = Session {
            token: Some(String::new()),
            role: Some("ROLE_STUDENT".to_string()),
        };

        for request in [
            NavigationRequest::to("/"),
            NavigationRequest::to("/profile").requiring([ROLE_STUDENT]),
            NavigationRequest::to("/company-profile/edit").requiring([ROLE_COMPANY_OWNER]),
        ] {
            assert_eq!(guard.decide(&anonymous, &request), redirect("/auth"));
            assert_eq!(guard.decide(&blank, &request), redirect("/auth"));
        }
    }

    #[test]
    fn token_without_required_roles_is_allowed() {
        let guard = guard();
        let session = Session {
            token: Some("t1".to_string()),
            role: None,
        };
        assert_eq!(guard.decide(&session, &NavigationRequest::to("/vacancies")), Decision::Allow);

        let garbage = Session::new("t1", "[not json");
        assert_eq!(guard.decide(&garbage, &NavigationRequest::to("/users")), Decision::Allow);
    }

    #[test]
    fn role_membership_decides() {
        let guard = guard();
        let request = NavigationRequest::to("/profile").requiring([ROLE_STUDENT]);

        assert_eq!(guard.decide(&Session::new("t1", "ROLE_STUDENT"), &request), Decision::Allow);
        assert_eq!(
            guard.decide(&Session::new("t1", "[\"ROLE_STUDENT\"]"), &request),
            Decision::Allow
        );
        assert_eq!(
            guard.decide(&Session::new("t1", "\"ROLE_EMPLOYER\""), &request),
            redirect("/")
        );
        assert_eq!(guard.decide(&Session::new("t1", "[not json"), &request), redirect("/"));
    }

    #[test]
    fn pinned_role_is_kept_in_its_subtree() {
        let guard = guard();
        let owner = Session::new("t1", "ROLE_COMPANY_OWNER");

        assert_eq!(
            guard.decide(&owner, &NavigationRequest::to("/vacancies")),
            redirect("/company-profile")
        );
        assert_eq!(
            guard.decide(&owner, &NavigationRequest::to("/company-profile-other")),
            redirect("/company-profile")
        );
        assert_eq!(
            guard.decide(&owner, &NavigationRequest::to("/company-profile/edit?tab=docs")),
            Decision::Allow
        );
        assert_eq!(
            guard.decide(&owner, &NavigationRequest::to("/company-profile/")),
            Decision::Allow
        );
    }

    #[test]
    fn pinning_runs_before_role_check() {
        let guard = guard();
        let owner = Session::new("t1", "ROLE_COMPANY_OWNER");
        let request = NavigationRequest::to("/profile").requiring([ROLE_STUDENT]);
        assert_eq!(guard.decide(&owner, &request), redirect("/company-profile"));
    }

    #[test]
    fn legacy_taxonomy_has_no_pins() {
        let guard = SessionGuard::new(RoleTaxonomy::legacy(), GuardPaths::default());
        let owner = Session::new("t1", "ROLE_COMPANY_OWNER");
        // Unrecognised under the legacy taxonomy, so just "no role".
        assert_eq!(guard.decide(&owner, &NavigationRequest::to("/vacancies")), Decision::Allow);
        assert_eq!(
            guard.decide(&owner, &NavigationRequest::to("/hr-profile").requiring(["ROLE_HR"])),
            redirect("/")
        );
    }

    #[test]
    fn landing_paths_by_role() {
        let guard = guard();
        assert_eq!(guard.landing_path(&Session::new("t", "ROLE_EMPLOYER")), "/hr-profile");
        assert_eq!(guard.landing_path(&Session::new("t", "ROLE_STUDENT")), "/profile");
        assert_eq!(
            guard.landing_path(&Session::new("t", "ROLE_COMPANY_OWNER")),
            "/company-profile"
        );
        assert_eq!(guard.landing_path(&Session::new("t", "")), "/profile");
    }

    #[test]
    fn route_table_lookup() {
        let routes = RouteTable::mospolyjob(&RoleTaxonomy::latest());

        assert_eq!(routes.request_for("/"), None);
        assert_eq!(routes.request_for("/auth"), None);

        let edit = routes.request_for("/profile/edit").unwrap();
        assert_eq!(edit.target_path, "/profile/edit");
        assert!(edit.required_roles.unwrap().contains(&Role::new(ROLE_STUDENT)));

        let vacancies = routes.request_for("/vacancies?page=2").unwrap();
        assert_eq!(vacancies.required_roles, None);

        // "/profile" must not swallow "/profiles".
        assert_eq!(routes.request_for("/profiles"), None);

        let owner = routes.request_for("/company-profile/edit").unwrap();
        assert_eq!(
            owner.required_roles,
            Some(BTreeSet::from([Role::new(ROLE_COMPANY_OWNER)]))
        );
    }

    #[test]
    fn route_table_follows_the_taxonomy() {
        let routes = RouteTable::mospolyjob(&RoleTaxonomy::legacy());

        let hr = routes.request_for(HR_PROFILE_PATH).unwrap().required_roles.unwrap();
        assert_eq!(hr, BTreeSet::from([Role::new(ROLE_HR)]));
        assert!(!hr.contains(&Role::new(ROLE_EMPLOYER)));

        let profile = routes.request_for("/profile").unwrap().required_roles.unwrap();
        assert!(profile.contains(&Role::new(ROLE_STUDENT)));
        assert!(profile.contains(&Role::new("ROLE_DEVELOPER")));
        assert!(!profile.contains(&Role::new(ROLE_HR)));

        // No pins, so the company profile is an ordinary public path
        assert_eq!(routes.request_for("/company-profile"), None);

        // A taxonomy without an employer tag leaves the HR profile to nobody
        let students_only = RouteTable::mospolyjob(&RoleTaxonomy::from_list("ROLE_STUDENT"));
        let nobody = students_only.request_for(HR_PROFILE_PATH).unwrap();
        assert_eq!(nobody.required_roles, Some(BTreeSet::new()));
    }

    #[test]
    fn every_role_may_open_its_landing_page() {
        for taxonomy in [
            RoleTaxonomy::latest(),
            RoleTaxonomy::legacy(),
            RoleTaxonomy::from_list("ROLE_STUDENT,ROLE_HR,ROLE_COMPANY")
                .with_pins_from_list("ROLE_COMPANY=/company"),
        ] {
            let guard = SessionGuard::new(taxonomy.clone(), GuardPaths::default());
            let routes = RouteTable::mospolyjob(&taxonomy);

            for role in taxonomy.recognized() {
                let session = Session::new("t1", role.as_str());
                let landing = guard.landing_path(&session);
                let decision = match routes.request_for(&landing) {
                    Some(request) => guard.decide(&session, &request),
                    None => Decision::Allow,
                };
                assert_eq!(decision, Decision::Allow, "{} landing on {}", role, landing);
            }
        }
    }
}
