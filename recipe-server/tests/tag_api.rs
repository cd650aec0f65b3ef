mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use recipe_server::build_app;
use serde_json::{Value, json};

use common::{TestContext, bearer};

const TAGS_URL: &str = "/api/recipe/tags";

fn detail_url(id: &str) -> String {
    format!("{}/{}", TAGS_URL, id)
}

#[actix_web::test]
async fn login_required_to_list_tags() {
    let ctx = TestContext::new();
    let app = test::init_service(build_app(ctx.state.clone())).await;

    let req = test::TestRequest::get().uri(TAGS_URL).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn tags_are_listed_by_name_descending() {
    let ctx = TestContext::new();
    let (user, token) = ctx.user_with_token("cook@example.com").await;
    ctx.state.tags.create(user.id, "Vegan".into()).await.unwrap();
    ctx.state.tags.create(user.id, "Dessert".into()).await.unwrap();
    let app = test::init_service(build_app(ctx.state.clone())).await;

    let req = test::TestRequest::get()
        .uri(TAGS_URL)
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Vegan", "Dessert"]);
}

#[actix_web::test]
async fn tags_are_limited_to_the_caller() {
    let ctx = TestContext::new();
    let (user, token) = ctx.user_with_token("cook@example.com").await;
    let (other, _) = ctx.user_with_token("other@example.com").await;
    ctx.state.tags.create(other.id, "Fruity".into()).await.unwrap();
    let tag = ctx.state.tags.create(user.id, "Comfort Food".into()).await.unwrap();
    let app = test::init_service(build_app(ctx.state.clone())).await;

    let req = test::TestRequest::get()
        .uri(TAGS_URL)
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(
        body,
        json!([{ "id": tag.id.to_string(), "name": "Comfort Food" }])
    );
}

#[actix_web::test]
async fn create_tag_binds_owner() {
    let ctx = TestContext::new();
    let (user, token) = ctx.user_with_token("cook@example.com").await;
    let app = test::init_service(build_app(ctx.state.clone())).await;

    let req = test::TestRequest::post()
        .uri(TAGS_URL)
        .insert_header(bearer(&token))
        .set_json(json!({ "name": "Test tag" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["name"], "Test tag");
    let stored = ctx.state.tags.list(user.id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id.to_string(), body["id"].as_str().unwrap());
}

#[actix_web::test]
async fn create_tag_with_blank_name_fails() {
    let ctx = TestContext::new();
    let (user, token) = ctx.user_with_token("cook@example.com").await;
    let app = test::init_service(build_app(ctx.state.clone())).await;

    let req = test::TestRequest::post()
        .uri(TAGS_URL)
        .insert_header(bearer(&token))
        .set_json(json!({ "name": "" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["name"][0], "This field may not be blank.");
    assert!(ctx.state.tags.list(user.id).await.unwrap().is_empty());
}

#[actix_web::test]
async fn tag_detail_update_and_delete() {
    let ctx = TestContext::new();
    let (user, token) = ctx.user_with_token("cook@example.com").await;
    let tag = ctx.state.tags.create(user.id, "Breakfast".into()).await.unwrap();
    let url = detail_url(&tag.id.to_string());
    let app = test::init_service(build_app(ctx.state.clone())).await;

    let req = test::TestRequest::patch()
        .uri(&url)
        .insert_header(bearer(&token))
        .set_json(json!({ "name": "Brunch" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["name"], "Brunch");

    let req = test::TestRequest::put()
        .uri(&url)
        .insert_header(bearer(&token))
        .set_json(json!({ "name": "Lunch" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["name"], "Lunch");

    let req = test::TestRequest::delete()
        .uri(&url)
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NO_CONTENT
    );

    let req = test::TestRequest::get()
        .uri(&url)
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn another_users_tag_is_not_found() {
    let ctx = TestContext::new();
    let (_, token) = ctx.user_with_token("cook@example.com").await;
    let (other, _) = ctx.user_with_token("other@example.com").await;
    let theirs = ctx.state.tags.create(other.id, "Private".into()).await.unwrap();
    let url = detail_url(&theirs.id.to_string());
    let app = test::init_service(build_app(ctx.state.clone())).await;

    let req = test::TestRequest::get()
        .uri(&url)
        .insert_header(bearer(&token))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["detail"], "Not found.");

    let req = test::TestRequest::delete()
        .uri(&url)
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
    assert!(ctx.state.tags.get(other.id, theirs.id).await.is_ok());
}

#[actix_web::test]
async fn deleted_tag_disappears_from_recipes() {
    let ctx = TestContext::new();
    let (user, token) = ctx.user_with_token("cook@example.com").await;
    let tag = ctx.state.tags.create(user.id, "Spicy".into()).await.unwrap();
    let app = test::init_service(build_app(ctx.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/recipe/recipes")
        .insert_header(bearer(&token))
        .set_json(json!({
            "title": "Chili",
            "time_minutes": 45,
            "price": "8.50",
            "tags": [tag.id],
        }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let recipe_url = format!("/api/recipe/recipes/{}", created["id"].as_str().unwrap());

    let req = test::TestRequest::delete()
        .uri(&detail_url(&tag.id.to_string()))
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NO_CONTENT
    );

    let req = test::TestRequest::get()
        .uri(&recipe_url)
        .insert_header(bearer(&token))
        .to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail["tags"], json!([]));
}
