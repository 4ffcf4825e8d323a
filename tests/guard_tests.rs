use mospolyjob_core::{
    ClientConfig, Decision, JobBoardClient, KeyValueStore, MemoryStore, NavigationRequest,
    ScriptedTransport, Session, SessionGuard, SessionProvider, StoreState, StoredSession,
    config::GuardPaths,
    roles::{
        ROLE_COMPANY_OWNER, ROLE_DEVELOPER, ROLE_EMPLOYER, ROLE_HR, ROLE_STUDENT, Role,
        RoleTaxonomy,
    },
    session::{ROLE_KEY, TOKEN_KEY},
};
use std::sync::Arc;

// --- Test Utilities ---

fn latest_guard() -> SessionGuard {
    SessionGuard::new(RoleTaxonomy::latest(), GuardPaths::default())
}

fn redirect(path: &str) -> Decision {
    Decision::Redirect(path.to_string())
}

fn offline_client() -> JobBoardClient {
    client_with_roles(RoleTaxonomy::latest())
}

fn client_with_roles(roles: RoleTaxonomy) -> JobBoardClient {
    let store: StoreState = Arc::new(MemoryStore::new());
    let config = ClientConfig {
        roles,
        ..Default::default()
    };
    JobBoardClient::new(config, Arc::new(ScriptedTransport::new()), store)
}

// --- Guard Decisions ---

#[test]
fn test_anonymous_viewer_is_sent_to_auth_everywhere() {
    let guard = latest_guard();
    let no_token = Session {
        token: None,
        role: Some("ROLE_STUDENT".to_string()),
    };
    // A whitespace-only token is treated as no token.
    let blank_token = Session {
        token: Some(" \t ".to_string()),
        role: Some("ROLE_STUDENT".to_string()),
    };

    for path in ["/", "/vacancies", "/profile/edit", "/company-profile", "/nowhere"] {
        for request in [
            NavigationRequest::to(path),
            NavigationRequest::to(path).requiring([ROLE_STUDENT, ROLE_EMPLOYER]),
            NavigationRequest::to(path).requiring(Vec::<String>::new()),
        ] {
            assert_eq!(guard.decide(&no_token, &request), redirect("/auth"));
            assert_eq!(guard.decide(&blank_token, &request), redirect("/auth"));
            assert_eq!(guard.decide(&Session::anonymous(), &request), redirect("/auth"));
        }
    }
}

#[test]
fn test_signed_in_viewer_passes_open_routes() {
    let guard = latest_guard();
    for role in ["ROLE_STUDENT", "ROLE_EMPLOYER", "\"ROLE_STUDENT\"", "", "ROLE_MARTIAN"] {
        let session = Session::new("t1", role);
        assert_eq!(
            guard.decide(&session, &NavigationRequest::to("/vacancies")),
            Decision::Allow,
            "role {:?}",
            role
        );
    }
}

#[test]
fn test_required_roles_admit_members_only() {
    let guard = latest_guard();
    let request = NavigationRequest::to("/profile").requiring([ROLE_STUDENT]);

    assert_eq!(guard.decide(&Session::new("t1", ROLE_STUDENT), &request), Decision::Allow);
    assert_eq!(guard.decide(&Session::new("t1", ROLE_EMPLOYER), &request), redirect("/"));
    assert_eq!(guard.decide(&Session::new("t1", "ROLE_MARTIAN"), &request), redirect("/"));

    let either = NavigationRequest::to("/users").requiring([ROLE_STUDENT, ROLE_EMPLOYER]);
    assert_eq!(guard.decide(&Session::new("t1", "employer"), &either), Decision::Allow);
}

#[test]
fn test_employer_quoted_role_cannot_open_student_page() {
    let guard = latest_guard();
    let session = Session::new("t1", "\"ROLE_EMPLOYER\"");
    let request = NavigationRequest::to("/profile").requiring([ROLE_STUDENT]);
    assert_eq!(guard.decide(&session, &request), redirect("/"));
}

#[test]
fn test_role_encodings_normalise_alike() {
    let taxonomy = RoleTaxonomy::latest();
    let student = Some(Role::new(ROLE_STUDENT));

    for raw in ["\"ROLE_STUDENT\"", "ROLE_STUDENT", "[\"ROLE_STUDENT\"]", " role_student "] {
        assert_eq!(taxonomy.normalize(Some(raw)), student, "raw {:?}", raw);
    }
}

#[test]
fn test_malformed_roles_mean_no_role() {
    let taxonomy = RoleTaxonomy::latest();
    let deeply_quoted = format!("{}x{}", "\"".repeat(12), "\"".repeat(12));
    for raw in ["[not json", "[]", "[1]", "\"", "{\"role\":1}", deeply_quoted.as_str()] {
        assert_eq!(taxonomy.normalize(Some(raw)), None, "raw {:?}", raw);
    }
    assert_eq!(taxonomy.normalize(None), None);
}

#[test]
fn test_legacy_taxonomy_speaks_hr() {
    let guard = SessionGuard::new(RoleTaxonomy::legacy(), GuardPaths::default());
    let hr = Session::new("t1", "[\"HR\"]");

    let request = NavigationRequest::to("/hr-profile").requiring([ROLE_HR]);
    assert_eq!(guard.decide(&hr, &request), Decision::Allow);
    assert_eq!(guard.landing_path(&hr), "/hr-profile");
}

#[test]
fn test_custom_redirect_targets() {
    let paths = GuardPaths {
        auth: "/login".to_string(),
        home: "/start".to_string(),
    };
    let guard = SessionGuard::new(RoleTaxonomy::latest(), paths);
    let request = NavigationRequest::to("/profile").requiring([ROLE_STUDENT]);

    assert_eq!(guard.decide(&Session::anonymous(), &request), redirect("/login"));
    assert_eq!(guard.decide(&Session::new("t", ROLE_EMPLOYER), &request), redirect("/start"));
}

// --- Session Provider & Client Wiring ---

#[test]
fn test_guard_reads_the_shared_store() {
    let store: StoreState = Arc::new(MemoryStore::new());
    let sessions = StoredSession::new(store.clone());
    let guard = latest_guard();
    let request = NavigationRequest::to("/profile").requiring([ROLE_STUDENT]);

    assert_eq!(guard.evaluate(&sessions, &request), redirect("/auth"));

    store.set(TOKEN_KEY, "t1".to_string()).unwrap();
    store.set(ROLE_KEY, "[\"ROLE_STUDENT\"]".to_string()).unwrap();
    assert_eq!(guard.evaluate(&sessions, &request), Decision::Allow);

    sessions.clear();
    assert_eq!(guard.evaluate(&sessions, &request), redirect("/auth"));
}

#[test]
fn test_client_navigation_uses_route_table() {
    let client = offline_client();

    assert_eq!(client.navigate("/"), Decision::Allow);
    assert_eq!(client.navigate("/vacancies"), redirect("/auth"));

    client.sessions.set(Session::new("t1", ROLE_COMPANY_OWNER)).unwrap();
    assert_eq!(client.navigate("/vacancies"), redirect("/company-profile"));
    assert_eq!(client.navigate("/company-profile/edit"), Decision::Allow);

    client.sessions.set(Session::new("t1", ROLE_STUDENT)).unwrap();
    assert_eq!(client.navigate("/hr-profile"), redirect("/"));
    assert_eq!(client.navigate("/profile/edit"), Decision::Allow);
}

#[test]
fn test_legacy_roles_reach_their_landing_pages() {
    let client = client_with_roles(RoleTaxonomy::legacy());

    let hr = Session::new("t1", "[\"ROLE_HR\"]");
    client.sessions.set(hr.clone()).unwrap();
    assert_eq!(client.guard.landing_path(&hr), "/hr-profile");
    assert_eq!(client.navigate("/hr-profile"), Decision::Allow);
    assert_eq!(client.navigate("/profile"), redirect("/"));

    client.sessions.set(Session::new("t1", ROLE_DEVELOPER)).unwrap();
    assert_eq!(client.navigate("/profile/edit"), Decision::Allow);
    assert_eq!(client.navigate("/hr-profile"), redirect("/"));

    // The latest tags mean nothing to the legacy taxonomy
    client.sessions.set(Session::new("t1", ROLE_EMPLOYER)).unwrap();
    assert_eq!(client.navigate("/hr-profile"), redirect("/"));
}

#[test]
fn test_configured_roles_drive_navigation() {
    let roles = RoleTaxonomy::from_list("ROLE_STUDENT, ROLE_HR");
    let client = client_with_roles(roles);

    let hr = Session::new("t1", ROLE_HR);
    client.sessions.set(hr.clone()).unwrap();
    let landing = client.guard.landing_path(&hr);
    assert_eq!(client.navigate(&landing), Decision::Allow);
}
