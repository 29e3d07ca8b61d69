use std::sync::Arc;

use axum::{Extension, Router};
use modkit::api::{Missing, OpenApiRegistry, OperationBuilder};

use crate::api::rest::dto;
use crate::api::rest::handlers::{self, Announcements, ContentResource, Events, Resources};
use crate::domain::service::Service;

type Op = OperationBuilder<Missing, Missing, ()>;

pub fn register_routes(
    mut router: Router,
    openapi: &dyn OpenApiRegistry,
    service: Arc<Service>,
) -> anyhow::Result<Router> {
    router = register_auth_routes(router, openapi);
    router = register_content_routes::<Announcements>(router, openapi, true);
    router = register_content_routes::<Events>(router, openapi, false);
    router = register_content_routes::<Resources>(router, openapi, true);
    router = register_event_routes(router, openapi);

    router = router.layer(Extension(service));
    Ok(router)
}

fn register_auth_routes(mut router: Router, openapi: &dyn OpenApiRegistry) -> Router {
    // POST /auth/register
    router = Op::post("/auth/register")
        .operation_id("campus_connect.register_account")
        .summary("Create an account")
        .description("Sign up as a student or faculty member and receive a bearer token")
        .tag("auth")
        .json_request::<dto::RegisterReq>(openapi, "Account details")
        .handler(handlers::register_account)
        .json_response_with_schema::<dto::AuthResponse>(openapi, 201, "Account created")
        .problem_responses(openapi, &[400, 409, 500])
        .register(router, openapi);

    // POST /auth/login
    router = Op::post("/auth/login")
        .operation_id("campus_connect.login")
        .summary("Log in")
        .tag("auth")
        .json_request::<dto::LoginReq>(openapi, "Credentials")
        .handler(handlers::login)
        .json_response_with_schema::<dto::AuthResponse>(openapi, 200, "Logged in")
        .problem_responses(openapi, &[401, 500])
        .register(router, openapi);

    // GET /auth/me
    router = Op::get("/auth/me")
        .operation_id("campus_connect.me")
        .summary("Current user")
        .tag("auth")
        .bearer_auth()
        .handler(handlers::me)
        .json_response_with_schema::<dto::UserDto>(openapi, 200, "The authenticated user")
        .problem_responses(openapi, &[401, 404, 500])
        .register(router, openapi);

    router
}

fn register_content_routes<R: ContentResource>(
    mut router: Router,
    openapi: &dyn OpenApiRegistry,
    likes: bool,
) -> Router {
    let collection = R::PATH;
    let item = format!("{collection}/{{id}}");
    let kind = R::KIND;

    router = Op::get(collection)
        .operation_id(format!("campus_connect.list_{}", R::TAG))
        .summary(format!("List {}", R::TAG))
        .description("Newest first")
        .tag(R::TAG)
        .handler(handlers::list_items::<R>)
        .json_list_response::<R::Dto>(openapi, 200, format!("All {}", R::TAG))
        .problem_responses(openapi, &[500])
        .register(router, openapi);

    router = Op::get(item.clone())
        .operation_id(format!("campus_connect.get_{kind}"))
        .summary(format!("Get {kind} by id"))
        .tag(R::TAG)
        .path_param("id", format!("{kind} UUID"))
        .handler(handlers::get_item::<R>)
        .json_response_with_schema::<R::Dto>(openapi, 200, format!("The {kind}"))
        .problem_responses(openapi, &[400, 404, 500])
        .register(router, openapi);

    router = Op::post(collection)
        .operation_id(format!("campus_connect.create_{kind}"))
        .summary(format!("Create {kind}"))
        .tag(R::TAG)
        .bearer_auth()
        .json_request::<R::Req>(openapi, format!("New {kind}"))
        .handler(handlers::create_item::<R>)
        .json_response_with_schema::<R::Dto>(openapi, 201, format!("Created {kind}"))
        .problem_responses(openapi, &[400, 401, 403, 500])
        .register(router, openapi);

    router = Op::put(item.clone())
        .operation_id(format!("campus_connect.update_{kind}"))
        .summary(format!("Replace {kind}"))
        .description("Owner or admin only. All writable fields are replaced.")
        .tag(R::TAG)
        .bearer_auth()
        .path_param("id", format!("{kind} UUID"))
        .json_request::<R::Req>(openapi, format!("Replacement {kind}"))
        .handler(handlers::update_item::<R>)
        .json_response_with_schema::<R::Dto>(openapi, 200, format!("Updated {kind}"))
        .problem_responses(openapi, &[400, 401, 403, 404, 500])
        .register(router, openapi);

    router = Op::delete(item.clone())
        .operation_id(format!("campus_connect.delete_{kind}"))
        .summary(format!("Delete {kind}"))
        .description("Owner or admin only. Removes the comment thread as well.")
        .tag(R::TAG)
        .bearer_auth()
        .path_param("id", format!("{kind} UUID"))
        .handler(handlers::delete_item::<R>)
        .empty_response(204, format!("{kind} deleted"))
        .problem_responses(openapi, &[401, 403, 404, 500])
        .register(router, openapi);

    router = Op::post(format!("{item}/comments"))
        .operation_id(format!("campus_connect.comment_{kind}"))
        .summary(format!("Comment on {kind}"))
        .tag(R::TAG)
        .bearer_auth()
        .path_param("id", format!("{kind} UUID"))
        .json_request::<dto::CommentReq>(openapi, "Comment text")
        .handler(handlers::add_comment::<R>)
        .json_response_with_schema::<R::Dto>(openapi, 201, format!("The {kind} with the new comment"))
        .problem_responses(openapi, &[400, 401, 404, 500])
        .register(router, openapi);

    // Events expose registration instead of likes.
    if likes {
        router = Op::post(format!("{item}/like"))
            .operation_id(format!("campus_connect.like_{kind}"))
            .summary(format!("Like or unlike {kind}"))
            .description("Flips the caller's like")
            .tag(R::TAG)
            .bearer_auth()
            .path_param("id", format!("{kind} UUID"))
            .handler(handlers::toggle_like::<R>)
            .json_response_with_schema::<R::Dto>(openapi, 200, format!("The {kind} after the toggle"))
            .problem_responses(openapi, &[401, 404, 500])
            .register(router, openapi);
    }

    router
}

fn register_event_routes(mut router: Router, openapi: &dyn OpenApiRegistry) -> Router {
    // POST /events/{id}/register
    router = Op::post("/events/{id}/register")
        .operation_id("campus_connect.register_for_event")
        .summary("Register for event")
        .tag("events")
        .bearer_auth()
        .path_param("id", "event UUID")
        .handler(handlers::register_for_event)
        .json_response_with_schema::<dto::EventDto>(openapi, 200, "The event with the caller registered")
        .problem_responses(openapi, &[401, 404, 409, 500])
        .register(router, openapi);

    // POST /events/{id}/cancel
    router = Op::post("/events/{id}/cancel")
        .operation_id("campus_connect.cancel_registration")
        .summary("Cancel event registration")
        .tag("events")
        .bearer_auth()
        .path_param("id", "event UUID")
        .handler(handlers::cancel_registration)
        .json_response_with_schema::<dto::EventDto>(openapi, 200, "The event without the caller")
        .problem_responses(openapi, &[401, 404, 409, 500])
        .register(router, openapi);

    router
}
