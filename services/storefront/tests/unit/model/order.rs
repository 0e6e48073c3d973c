use std::str::FromStr;

use storefront::error::AppErrorCode;
use storefront::model::{OrderStatus, UserModel, UserRole};

#[test]
fn order_status_parse() {
    let all = [
        OrderStatus::Pending,
        OrderStatus::Delivering,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];
    for s in all {
        assert_eq!(OrderStatus::from_str(s.label()).unwrap(), s);
    }
    for label in ["pending", "Shipped", ""] {
        let err = OrderStatus::from_str(label).unwrap_err();
        assert_eq!(err.code, AppErrorCode::InvalidState);
    }
}

#[test]
fn user_role_admin() {
    let mut user = UserModel {
        id: 3,
        username: "kaito".to_string(),
        email: "kaito@example.org".to_string(),
        role: UserRole::from_str("customer").unwrap(),
    };
    assert!(!user.is_admin());
    user.role = UserRole::from_str("admin").unwrap();
    assert!(user.is_admin());
    let err = UserRole::from_str("root").unwrap_err();
    assert_eq!(err.code, AppErrorCode::InvalidInput);
}
