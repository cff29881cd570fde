use chrono::Utc;
use freshora_portal::models::{
    DashboardStats, OrderStatus, RegisterRequest, Role, UpdateOrderStatusRequest, UserProfile,
    UserRecord,
};
use serde_json::json;
use uuid::Uuid;

// --- Test Utilities ---

fn seller_record() -> UserRecord {
    UserRecord {
        id: Uuid::new_v4(),
        name: "Sam".to_string(),
        email: "sam@farm.io".to_string(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        role: Role::Seller,
        store_name: Some("Sam's Farm".to_string()),
        created_at: Utc::now(),
    }
}

// --- Registration Payloads ---

#[test]
fn test_register_request_is_tagged_by_role() {
    let seller: RegisterRequest = serde_json::from_value(json!({
        "role": "seller",
        "name": "Sam",
        "email": "sam@farm.io",
        "password": "pw",
        "storeName": "Sam's Farm"
    }))
    .unwrap();
    assert_eq!(seller.role(), Role::Seller);
    match seller {
        RegisterRequest::Seller(r) => assert_eq!(r.store_name, "Sam's Farm"),
        other => panic!("expected seller, got {other:?}"),
    }

    let admin: RegisterRequest = serde_json::from_value(json!({
        "role": "admin",
        "name": "Root",
        "email": "root@example.com",
        "password": "pw",
        "adminSecret": "s3cret"
    }))
    .unwrap();
    assert_eq!(admin.role(), Role::Admin);
    assert_eq!(admin.common(), ("Root", "root@example.com", "pw"));
}

#[test]
fn test_legacy_user_role_maps_to_customer() {
    let request: RegisterRequest = serde_json::from_value(json!({
        "role": "user",
        "name": "Old",
        "email": "old@client.io",
        "password": "pw"
    }))
    .unwrap();
    assert_eq!(request.role(), Role::Customer);

    let role: Role = serde_json::from_value(json!("user")).unwrap();
    assert_eq!(role, Role::Customer);
    assert_eq!("user".parse::<Role>().unwrap(), Role::Customer);
    // Serialized form is always the canonical name.
    assert_eq!(serde_json::to_value(role).unwrap(), json!("customer"));
}

#[test]
fn test_seller_without_store_name_does_not_parse() {
    let result = serde_json::from_value::<RegisterRequest>(json!({
        "role": "seller",
        "name": "Sam",
        "email": "sam@farm.io",
        "password": "pw"
    }));
    assert!(result.is_err());
}

#[test]
fn test_admin_without_secret_parses_with_empty_secret() {
    let request: RegisterRequest = serde_json::from_value(json!({
        "role": "admin",
        "name": "Root",
        "email": "root@example.com",
        "password": "pw"
    }))
    .unwrap();
    match request {
        RegisterRequest::Admin(r) => assert!(r.admin_secret.is_empty()),
        other => panic!("expected admin, got {other:?}"),
    }
}

#[test]
fn test_customer_payload_carrying_admin_secret_stays_customer() {
    let request: RegisterRequest = serde_json::from_value(json!({
        "role": "customer",
        "name": "Eve",
        "email": "eve@example.com",
        "password": "pw",
        "adminSecret": "whatever"
    }))
    .unwrap();
    assert!(matches!(request, RegisterRequest::Customer(_)));
}

#[test]
fn test_unknown_role_is_rejected() {
    for role in ["superuser", "Admin", ""] {
        let result = serde_json::from_value::<RegisterRequest>(json!({
            "role": role,
            "name": "X",
            "email": "x@example.com",
            "password": "pw"
        }));
        assert!(result.is_err(), "role {role:?} should not parse");
        assert!(role.parse::<Role>().is_err());
    }
}

// --- Output Projections ---

#[test]
fn test_user_profile_never_carries_password_hash() {
    let record = seller_record();
    let profile = UserProfile::from(&record);
    let json = serde_json::to_value(&profile).unwrap();

    assert_eq!(json["storeName"], "Sam's Farm");
    assert_eq!(json["role"], "seller");
    let rendered = json.to_string();
    assert!(!rendered.contains("argon2"));
    assert!(json.get("passwordHash").is_none());
    assert!(json.get("password").is_none());
}

#[test]
fn test_user_record_debug_redacts_hash() {
    let rendered = format!("{:?}", seller_record());
    assert!(rendered.contains("<redacted>"));
    assert!(!rendered.contains("argon2"));
}

#[test]
fn test_customer_profile_omits_store_name() {
    let record = UserRecord {
        role: Role::Customer,
        store_name: None,
        ..seller_record()
    };
    let json = serde_json::to_value(UserProfile::from(record)).unwrap();
    assert!(json.get("storeName").is_none());
}

#[test]
fn test_dashboard_stats_uses_camel_case_keys() {
    let stats = DashboardStats {
        total_sales: 0.0,
        total_orders: 0,
        total_users: 0,
        total_products: 0,
        sales_data: vec![],
        order_status_data: vec![],
        unrecognized_status_count: 0,
        recent_orders: vec![],
    };
    let json = serde_json::to_value(&stats).unwrap();
    for key in [
        "totalSales",
        "totalOrders",
        "totalUsers",
        "totalProducts",
        "salesData",
        "orderStatusData",
        "unrecognizedStatusCount",
        "recentOrders",
    ] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
}

// --- Order Status ---

#[test]
fn test_order_status_parse_is_exact() {
    assert_eq!(OrderStatus::parse("Shipped"), Some(OrderStatus::Shipped));
    assert_eq!(OrderStatus::parse("shipped"), None);
    assert_eq!(OrderStatus::parse(" Shipped"), None);
    assert_eq!(OrderStatus::parse(""), None);
    for status in OrderStatus::ALL {
        assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
    }
}

#[test]
fn test_status_update_only_accepts_canonical_values() {
    let ok: UpdateOrderStatusRequest =
        serde_json::from_value(json!({ "status": "Delivered" })).unwrap();
    assert_eq!(ok.status, OrderStatus::Delivered);

    assert!(serde_json::from_value::<UpdateOrderStatusRequest>(json!({ "status": "delivered" })).is_err());
    assert!(serde_json::from_value::<UpdateOrderStatusRequest>(json!({ "status": "Refunded" })).is_err());
}
