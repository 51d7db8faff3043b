//! Route table: one nested router per role prefix sharing the identity
//! handlers, plus the public surface. Session state lives in an in-memory
//! store behind an http-only cookie.

use axum::error_handling::HandleErrorLayer;
use axum::routing::{delete, get, post, put};
use axum::{BoxError, Extension, Router};
use http::StatusCode;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_sessions::{MemoryStore, SessionManagerLayer};

use crate::backend::handlers_admin;
use crate::backend::handlers_doctor;
use crate::backend::handlers_employee;
use crate::backend::handlers_identity::{
    dashboard_page, form_page, login, profile_data, profile_page, signup, update_profile,
};
use crate::backend::handlers_patient;
use crate::backend::handlers_public::{
    blog_page, blog_post_page, blog_submit, blog_view, chat_history, chat_send, index, logout,
};
use crate::backend::handlers_supplier;
use crate::models::Role;

pub fn get_router() -> Router {
    // CORS open to any origin in debug builds only.
    let router = if cfg!(debug_assertions) {
        let cors = CorsLayer::new()
            .allow_methods(tower_http::cors::AllowMethods::any())
            .allow_origin(Any);
        Router::new().layer(cors)
    } else {
        Router::new()
    };

    let store = MemoryStore::default();
    let session_manager = SessionManagerLayer::new(store).with_http_only(true);

    let service = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(|_e: BoxError| async move {
            StatusCode::BAD_REQUEST
        }))
        .layer(session_manager);

    router
        .merge(public_routes())
        .nest("/patient", identity_routes(Role::Patient).merge(patient_routes()))
        .nest("/doctor", identity_routes(Role::Doctor).merge(doctor_routes()))
        .nest("/admin", identity_routes(Role::Admin).merge(admin_routes()))
        .nest("/employee", identity_routes(Role::Employee).merge(employee_routes()))
        .nest("/supplier", identity_routes(Role::Supplier).merge(supplier_routes()))
        .layer(service)
}

/// The uniform identity surface, mounted once per role prefix.
fn identity_routes(role: Role) -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/form", get(form_page))
        .route("/dashboard", get(dashboard_page))
        .route("/profile", get(profile_page))
        .route("/profile-data", get(profile_data))
        .route("/update-profile", post(update_profile))
        .layer(Extension(role))
}

fn public_routes() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/logout", get(logout))
        .route("/blog", get(blog_page))
        .route("/blog/post", get(blog_post_page))
        .route("/blog/submit", post(blog_submit))
        .route("/blog/:id", get(blog_view))
        .route("/chat/send", post(chat_send))
        .route("/chat/:appointment_id", get(chat_history))
}

fn patient_routes() -> Router {
    Router::new()
        .route(
            "/appointments",
            post(handlers_patient::book_appointment).get(handlers_patient::my_appointments),
        )
        .route(
            "/appointments/:id/cancel",
            post(handlers_patient::cancel_appointment),
        )
        .route("/prescriptions", get(handlers_patient::my_prescriptions))
        .route(
            "/orders",
            post(handlers_patient::place_order).get(handlers_patient::my_orders),
        )
        .route("/api/medicines", get(handlers_patient::store_medicines))
        .route("/api/doctors", get(handlers_patient::available_doctors))
}

fn doctor_routes() -> Router {
    Router::new()
        .route("/appointments", get(handlers_doctor::all_appointments))
        .route(
            "/appointments/upcoming",
            get(handlers_doctor::upcoming_appointments),
        )
        .route(
            "/appointments/previous",
            get(handlers_doctor::previous_appointments),
        )
        .route(
            "/appointments/:id/confirm",
            post(handlers_doctor::confirm_appointment),
        )
        .route(
            "/appointments/:id/complete",
            post(handlers_doctor::complete_appointment),
        )
        .route(
            "/appointments/:id/cancel",
            post(handlers_doctor::cancel_appointment),
        )
        .route("/block-slot", post(handlers_doctor::block_slot))
        .route("/online-status", post(handlers_doctor::set_online_status))
        .route("/api/daily-earnings", get(handlers_doctor::daily_earnings))
        .route(
            "/prescriptions",
            post(handlers_doctor::create_prescription).get(handlers_doctor::list_prescriptions),
        )
        .route(
            "/prescriptions/:id",
            get(handlers_doctor::get_prescription).put(handlers_doctor::update_prescription),
        )
}

fn admin_routes() -> Router {
    Router::new()
        .route("/users", get(handlers_admin::list_users))
        .route("/users/:type/:id", delete(handlers_admin::delete_user))
        .route("/api/appointments", get(handlers_admin::api_appointments))
        .route("/api/earnings", get(handlers_admin::api_earnings))
        .route("/api/signins", get(handlers_admin::api_signins))
}

fn employee_routes() -> Router {
    Router::new()
        .route("/doctor_requests", get(handlers_employee::doctor_requests))
        .route(
            "/doctor_requests_count",
            get(handlers_employee::doctor_requests_count),
        )
        .route(
            "/approve_doctor/:id",
            post(handlers_employee::approve_doctor),
        )
}

fn supplier_routes() -> Router {
    Router::new()
        .route("/api/add-medicine", post(handlers_supplier::add_medicine))
        .route("/api/medicines", get(handlers_supplier::my_medicines))
        .route(
            "/api/medicines/:id",
            delete(handlers_supplier::delete_medicine),
        )
        .route("/api/orders", get(handlers_supplier::my_orders))
        .route(
            "/api/orders/:id/deliver",
            put(handlers_supplier::deliver_order),
        )
}
