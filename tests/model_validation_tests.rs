use mospolyjob_core::models::{
    AuthResponse, CompanyItem, CompanyType, NewVacancy, Pagination, PositionItem, UserListItem,
    VacancyItem,
};
use serde_json::json;

// --- Vacancy Schemas ---

#[test]
fn test_vacancy_item_tolerates_both_timestamp_names() {
    let old: VacancyItem =
        serde_json::from_value(json!({ "id": "v1", "create_at": "2024-09-01" })).unwrap();
    let new: VacancyItem = serde_json::from_value(json!({
        "id": "v2",
        "created_at": "2025-02-01",
        "create_at": "ignored"
    }))
    .unwrap();

    assert_eq!(old.created(), Some("2024-09-01"));
    assert_eq!(new.created(), Some("2025-02-01"));
}

#[test]
fn test_vacancy_item_unknown_fields_are_ignored() {
    let item: VacancyItem = serde_json::from_value(json!({
        "id": "v1",
        "title": "Tester",
        "salary": 55000.5,
        "owner": { "nested": true }
    }))
    .unwrap();
    assert_eq!(item.salary, Some(55000.5));
    assert_eq!(item.company_ref(), None);
}

#[test]
fn test_new_vacancy_omits_unset_fields() {
    let payload = NewVacancy {
        title: "Frontend".to_string(),
        work_format: Some("hybrid".to_string()),
        ..Default::default()
    };
    assert_eq!(
        serde_json::to_value(&payload).unwrap(),
        json!({ "title": "Frontend", "work_format": "hybrid" })
    );
}

#[test]
fn test_position_label_priority() {
    let position: PositionItem =
        serde_json::from_value(json!({ "id": "7", "title": "  ", "name": "Mobile" })).unwrap();
    assert_eq!(position.label(), "Mobile");
    assert_eq!(PositionItem::default().label(), "");
}

#[test]
fn test_scalar_fields_accept_either_form() {
    let item: VacancyItem = serde_json::from_value(json!({
        "id": 42,
        "salary": " 75000 ",
        "experience": 2,
        "company_id": 7,
        "attachment_id": { "unexpected": true }
    }))
    .unwrap();
    assert_eq!(item.id.as_deref(), Some("42"));
    assert_eq!(item.salary, Some(75000.0));
    assert_eq!(item.experience, Some(2.0));
    assert_eq!(item.company_ref(), Some("7"));
    assert_eq!(item.attachment_id, None);

    let user: UserListItem =
        serde_json::from_value(json!({ "id": 5, "first_name": "Ann", "age": "21" })).unwrap();
    assert_eq!(user.id.as_deref(), Some("5"));
    assert_eq!(user.age, Some(21));

    let odd: UserListItem = serde_json::from_value(json!({ "age": -3 })).unwrap();
    assert_eq!(odd.age, None);

    let pagination: Pagination =
        serde_json::from_value(json!({ "current_page": "2", "pages": 4, "total": null })).unwrap();
    assert_eq!(pagination.current_page, Some(2));
    assert_eq!(pagination.pages, Some(4));
    assert_eq!(pagination.total, None);
}

// --- Company Schemas ---

#[test]
fn test_company_type_both_forms() {
    let plain: CompanyItem =
        serde_json::from_value(json!({ "name": "A", "type": "Startup" })).unwrap();
    let tagged: CompanyItem =
        serde_json::from_value(json!({ "name": "B", "type": { "value": "Enterprise" } })).unwrap();
    let flat: CompanyItem =
        serde_json::from_value(json!({ "name": "C", "company_type": "NGO" })).unwrap();

    assert_eq!(plain.kind, Some(CompanyType::Plain("Startup".to_string())));
    assert_eq!(plain.type_label(), "Startup");
    assert_eq!(tagged.type_label(), "Enterprise");
    assert_eq!(flat.type_label(), "NGO");
}

#[test]
fn test_company_listability_and_links() {
    let placeholder: CompanyItem =
        serde_json::from_value(json!({ "name": "Just a name" })).unwrap();
    assert!(!placeholder.is_listable());

    let real: CompanyItem = serde_json::from_value(json!({
        "name": "Acme",
        "site": "acme.ru",
        "image_url": "https://cdn/acme.png"
    }))
    .unwrap();
    assert!(real.is_listable());
    assert_eq!(real.site_url().as_deref(), Some("https://acme.ru"));
    assert_eq!(real.backend_logo_url(), Some("https://cdn/acme.png"));

    let secure: CompanyItem =
        serde_json::from_value(json!({ "name": "S", "site": "HTTP://s.ru" })).unwrap();
    assert_eq!(secure.site_url().as_deref(), Some("HTTP://s.ru"));
}

// --- Users & Auth ---

#[test]
fn test_user_stub_detection() {
    let stub: UserListItem = serde_json::from_value(json!({ "email": "x@y.ru" })).unwrap();
    let named: UserListItem =
        serde_json::from_value(json!({ "first_name": "Maria", "email": "m@y.ru" })).unwrap();
    let useful: UserListItem =
        serde_json::from_value(json!({ "age": 19, "telegram": "@anon" })).unwrap();

    assert!(stub.is_stub());
    assert!(!named.is_stub());
    assert!(!useful.is_stub());
    assert_eq!(useful.telegram_handle(), Some("@anon"));
    assert_eq!(named.full_name(), "Maria");
}

#[test]
fn test_auth_response_field_variants() {
    let cases = [
        (json!({ "token": "a", "role": "ROLE_STUDENT" }), Some("a"), Some("ROLE_STUDENT")),
        (
            json!({ "access_token": "b", "user": { "role": "ROLE_EMPLOYER" } }),
            Some("b"),
            Some("ROLE_EMPLOYER"),
        ),
        (
            json!({ "accessToken": "c", "data": { "role": "ROLE_COMPANY_OWNER" } }),
            Some("c"),
            Some("ROLE_COMPANY_OWNER"),
        ),
        (json!({ "token": "", "jwt": "d" }), Some("d"), None),
        (json!({ "message": "ok" }), None, None),
    ];

    for (body, token, role) in cases {
        let parsed = AuthResponse::from_body(&body);
        assert_eq!(parsed.token.as_deref(), token, "body {}", body);
        assert_eq!(parsed.role.as_deref(), role, "body {}", body);
    }
}
