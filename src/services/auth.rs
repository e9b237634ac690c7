//! Demo sign-in and role-based permissions.
//!
//! Credentials are a fixed list; there is no token, expiry or password
//! hashing. The session itself is persisted like any other collection under
//! the `auth` key.

use lazy_static::lazy_static;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::{
    errors::ServiceError,
    events::Event,
    models::{AuthState, Employee, Order, Role, Transfer, User},
    storage::StorageKey,
    store::DataStore,
};

struct DemoCredential {
    password: &'static str,
    user: User,
}

fn demo_user(
    id: &str,
    name: &str,
    email: &str,
    password: &'static str,
    role: Role,
    showroom_id: Option<&str>,
    avatar: &str,
) -> DemoCredential {
    DemoCredential {
        password,
        user: User {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            role,
            showroom_id: showroom_id.map(str::to_string),
            avatar: Some(avatar.to_string()),
        },
    }
}

lazy_static! {
    static ref DEMO_USERS: Vec<DemoCredential> = vec![
        demo_user(
            "1",
            "Super Admin",
            "admin@agrierp.com",
            "admin123",
            Role::SuperAdmin,
            None,
            "https://images.unsplash.com/photo-1472099645785-5658abf4ff4e?w=400",
        ),
        demo_user(
            "2",
            "Mumbai Store Manager",
            "mumbai@agrierp.com",
            "mumbai123",
            Role::ShowroomAdmin,
            Some("1"),
            "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?w=400",
        ),
        demo_user(
            "3",
            "Punjab Store Manager",
            "punjab@agrierp.com",
            "punjab123",
            Role::ShowroomAdmin,
            Some("2"),
            "https://images.unsplash.com/photo-1500648767791-00dcc994a43e?w=400",
        ),
        demo_user(
            "4",
            "Store Employee",
            "employee@agrierp.com",
            "emp123",
            Role::Employee,
            Some("1"),
            "https://images.unsplash.com/photo-1494790108755-2616b332c96d?w=400",
        ),
    ];

    /// Permissions per role. Super Admin is not listed; it holds every
    /// permission.
    static ref PERMISSIONS: HashMap<Role, HashSet<&'static str>> = {
        let mut permissions = HashMap::new();
        permissions.insert(
            Role::ShowroomAdmin,
            [
                "view_dashboard",
                "view_products",
                "manage_products",
                "view_showrooms",
                "manage_showrooms",
                "view_orders",
                "manage_orders",
                "view_employees",
                "manage_employees",
                "view_attendance",
                "manage_attendance",
                "view_salary",
                "manage_salary",
                "view_transfers",
                "request_transfers",
                "view_reports",
                "view_settings",
            ]
            .into_iter()
            .collect(),
        );
        permissions.insert(
            Role::Employee,
            [
                "view_dashboard",
                "view_products",
                "view_orders",
                "view_attendance",
                "mark_attendance",
                "view_salary",
                "view_profile",
            ]
            .into_iter()
            .collect(),
        );
        permissions
    };
}

/// Whether `role` grants `permission`.
pub fn role_has_permission(role: Role, permission: &str) -> bool {
    match role {
        Role::SuperAdmin => true,
        other => PERMISSIONS
            .get(&other)
            .map(|granted| granted.contains(permission))
            .unwrap_or(false),
    }
}

/// Showroom a session is confined to. `None` means every showroom.
fn showroom_scope(session: &AuthState) -> Option<&str> {
    match session.role {
        Some(Role::SuperAdmin) => None,
        _ => session.showroom_id.as_deref(),
    }
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<DataStore>,
    login_delay: Duration,
}

impl AuthService {
    pub fn new(store: Arc<DataStore>, login_delay: Duration) -> Self {
        Self { store, login_delay }
    }

    /// Checks the credentials after the configured delay and persists the
    /// signed-in session.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthState, ServiceError> {
        if !self.login_delay.is_zero() {
            tokio::time::sleep(self.login_delay).await;
        }

        let user = DEMO_USERS
            .iter()
            .find(|c| c.user.email == email && c.password == password)
            .map(|c| c.user.clone())
            .ok_or_else(|| {
                warn!(email, "Login failed");
                ServiceError::Unauthorized("Invalid email or password".to_string())
            })?;

        let session = AuthState::signed_in(user);
        let persisted = session.clone();
        self.store
            .mutate(&[StorageKey::Auth], move |s| {
                s.auth = persisted;
                Ok(())
            })
            .await?;

        if let Some(user) = &session.user {
            info!(user_id = %user.id, role = %user.role, "User logged in");
            self.store
                .emit(Event::LoggedIn {
                    user_id: user.id.clone(),
                    at: chrono::Utc::now(),
                })
                .await;
        }
        Ok(session)
    }

    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ServiceError> {
        self.store
            .mutate(&[StorageKey::Auth], |s| {
                s.auth = AuthState::signed_out();
                Ok(())
            })
            .await?;
        info!("User logged out");
        self.store.emit(Event::LoggedOut).await;
        Ok(())
    }

    pub async fn current_session(&self) -> AuthState {
        self.store.read(|s| s.auth.clone()).await
    }

    /// Permission check for the signed-in user; always false when signed out.
    pub async fn has_permission(&self, permission: &str) -> bool {
        self.store
            .read(|s| {
                s.auth
                    .user
                    .as_ref()
                    .map(|user| role_has_permission(user.role, permission))
                    .unwrap_or(false)
            })
            .await
    }

    /// Fails with `Unauthorized` when signed out and `Forbidden` when the
    /// role lacks the permission.
    pub async fn require_permission(&self, permission: &str) -> Result<User, ServiceError> {
        let session = self.current_session().await;
        let user = session
            .user
            .ok_or_else(|| ServiceError::Unauthorized("Not signed in".to_string()))?;
        if !role_has_permission(user.role, permission) {
            return Err(ServiceError::Forbidden(format!(
                "{} may not {}",
                user.role, permission
            )));
        }
        Ok(user)
    }

    /// Orders the session may see: all for a Super Admin, otherwise those of
    /// the session's showroom.
    pub async fn visible_orders(&self) -> Vec<Order> {
        self.store
            .read(|s| {
                if !s.auth.is_authenticated {
                    return Vec::new();
                }
                match showroom_scope(&s.auth) {
                    None => s.orders.clone(),
                    Some(id) => s
                        .orders
                        .iter()
                        .filter(|o| o.showroom_id == id)
                        .cloned()
                        .collect(),
                }
            })
            .await
    }

    pub async fn visible_transfers(&self) -> Vec<Transfer> {
        self.store
            .read(|s| {
                if !s.auth.is_authenticated {
                    return Vec::new();
                }
                match showroom_scope(&s.auth) {
                    None => s.transfers.clone(),
                    Some(id) => s
                        .transfers
                        .iter()
                        .filter(|t| t.involves_showroom(id))
                        .cloned()
                        .collect(),
                }
            })
            .await
    }

    pub async fn visible_employees(&self) -> Vec<Employee> {
        self.store
            .read(|s| {
                if !s.auth.is_authenticated {
                    return Vec::new();
                }
                match showroom_scope(&s.auth) {
                    None => s.employees.clone(),
                    Some(id) => s
                        .employees
                        .iter()
                        .filter(|e| e.showroom_id == id)
                        .cloned()
                        .collect(),
                }
            })
            .await
    }
}
