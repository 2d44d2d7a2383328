pub mod health;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Feeds
        .route("/feed/student", get(crate::feed::handlers::student_feed))
        .route("/feed/company", get(crate::feed::handlers::company_feed))
        // Decisions
        .route(
            "/decisions/student/post",
            post(crate::decisions::handlers::student_decision_post),
        )
        .route(
            "/decisions/company/student-post",
            post(crate::decisions::handlers::company_decision_card),
        )
        .route(
            "/decisions/company/student",
            post(crate::decisions::handlers::company_decision_student),
        )
        // Saves
        .route(
            "/saves/student/post",
            post(crate::decisions::saves::set_saved_post),
        )
        .route(
            "/saves/student/posts",
            get(crate::decisions::saves::list_saved_posts),
        )
        .route(
            "/saves/company/student-post",
            post(crate::decisions::saves::set_saved_card),
        )
        .route(
            "/saves/company/student-posts",
            get(crate::decisions::saves::list_saved_cards),
        )
        // Applications
        .route(
            "/applications",
            get(crate::applications::handlers::list_applications),
        )
        .route(
            "/applications/:application_id/status",
            post(crate::applications::handlers::set_status),
        )
        // Conversations
        .route(
            "/conversations/:conversation_id/messages",
            get(crate::chat::handlers::list_messages).post(crate::chat::handlers::send_message),
        )
        .route(
            "/conversations/:conversation_id/read",
            post(crate::chat::handlers::mark_read),
        )
        // Posts
        .route("/posts", post(crate::posts::handlers::create_post))
        .route("/posts/me", get(crate::posts::handlers::list_my_posts))
        .route(
            "/posts/company/:company_user_id",
            get(crate::posts::handlers::list_company_posts),
        )
        .route(
            "/posts/:post_id",
            delete(crate::posts::handlers::delete_post),
        )
        // Profile posts
        .route(
            "/profile-posts",
            post(crate::profiles::experience::create_experience_post),
        )
        .route(
            "/profile-posts/me",
            get(crate::profiles::experience::list_my_experience_posts),
        )
        .route(
            "/profile-posts/:id",
            get(crate::profiles::experience::list_experience_posts)
                .delete(crate::profiles::experience::delete_experience_post),
        )
        // Profiles
        .route(
            "/profiles/students/:student_user_id",
            get(crate::profiles::handlers::get_student_profile),
        )
        .route(
            "/profiles/me",
            put(crate::profiles::handlers::update_my_profile),
        )
        .with_state(state)
}
