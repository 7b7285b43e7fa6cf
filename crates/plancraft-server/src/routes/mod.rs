//! Route tables. Every route here sits behind the auth middleware.

mod chat;
mod generate;
mod planning;
mod projects;
mod tasks;
mod uml;
mod users;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};

use crate::AppState;

pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Chat agent
        .route("/chat/agent_query", post(chat::agent_query))
        // Prompt chains
        .route("/roadmap", post(generate::roadmap))
        .route("/milestones", post(generate::milestones))
        .route("/tasks", post(generate::tasks))
        .route("/plan", post(generate::plan))
        .route("/system-design", post(generate::system_design))
        .route("/system-design/text", post(generate::system_design_text))
        .route(
            "/features/analyze-dependencies",
            post(generate::analyze_dependencies),
        )
        .route("/features/breakdown", post(generate::breakdown))
        // Users
        .route("/users", post(users::create))
        .route("/users/{id}", get(users::get_one))
        .route(
            "/company/{company}/employees/search",
            get(users::search_employees),
        )
        // Projects and memberships
        .route("/projects", post(projects::create).get(projects::list))
        .route(
            "/projects/{id}",
            get(projects::get_one)
                .put(projects::update)
                .delete(projects::delete),
        )
        .route("/user-projects", post(projects::add_member))
        .route("/user-projects/user/{id}", get(projects::projects_of_user))
        .route(
            "/user-projects/project/{id}",
            get(projects::members_of_project),
        )
        .route(
            "/user-projects/{id}",
            delete(projects::remove_member),
        )
        // Milestones, features, tech stack
        .route("/milestones/items", post(planning::create_milestone))
        .route(
            "/milestones/items/project/{id}",
            get(planning::milestones_for_project),
        )
        .route(
            "/milestones/items/{id}",
            get(planning::get_milestone)
                .put(planning::update_milestone)
                .delete(planning::delete_milestone),
        )
        .route("/features", post(planning::create_feature))
        .route(
            "/features/project/{id}",
            get(planning::features_for_project),
        )
        .route(
            "/features/milestone/{id}",
            get(planning::features_for_milestone),
        )
        .route(
            "/features/{id}",
            get(planning::get_feature)
                .put(planning::update_feature)
                .delete(planning::delete_feature),
        )
        .route("/tech_stack", post(planning::create_tech))
        .route("/tech_stack/project/{id}", get(planning::tech_for_project))
        .route(
            "/tech_stack/{id}",
            get(planning::get_tech)
                .put(planning::update_tech)
                .delete(planning::delete_tech),
        )
        // Task assignments
        .route("/task-assignments", post(tasks::create))
        .route("/task-assignments/my", get(tasks::mine))
        .route(
            "/task-assignments/{id}",
            get(tasks::get_one).patch(tasks::update),
        )
        // UML documents
        .route("/project-uml", post(uml::create))
        .route("/project-uml/project/{id}", get(uml::for_project))
        .route(
            "/project-uml/{id}",
            get(uml::get_one).put(uml::replace).delete(uml::delete),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_table_builds() {
        let _ = api_routes();
    }
}
