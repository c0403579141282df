//! Integration tests for reviews: ownership, moderation, sanitization.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The identity, catalog, and engagement servers running
//!
//! Run with: cargo test -p sugarcane-integration-tests -- --ignored

use serde_json::{Value, json};

use sugarcane_integration_tests::{
    TEST_PASSWORD, client, create_product, engagement_base_url, error_kind, register_account,
    unique_username,
};

/// Register an admin, a product, and return `(admin, product_id)`.
async fn admin_and_product(http: &reqwest::Client) -> (String, String) {
    let admin = unique_username("admin");
    register_account(http, &admin, "admin").await;
    let product = create_product(http, &admin, &unique_username("reviewable"), "5", 10).await;
    let product_id = product["id"].as_str().expect("product id").to_owned();
    (admin, product_id)
}

/// Submit a review as `username`; asserts success and returns it.
async fn submit_review(
    http: &reqwest::Client,
    username: &str,
    product_id: &str,
    rating: i32,
    comment: &str,
) -> Value {
    let response = http
        .post(format!("{}/reviews", engagement_base_url()))
        .basic_auth(username, Some(TEST_PASSWORD))
        .json(&json!({ "product_id": product_id, "rating": rating, "comment": comment }))
        .send()
        .await
        .expect("submit review failed");

    assert_eq!(response.status().as_u16(), 201, "review should be created");
    response.json().await.expect("review response not JSON")
}

#[tokio::test]
#[ignore = "Requires running services and PostgreSQL"]
async fn test_ownership_and_moderation_scenario() {
    let http = client();
    let (admin, product_id) = admin_and_product(&http).await;

    let owner = unique_username("owner");
    let intruder = unique_username("intruder");
    register_account(&http, &owner, "standard").await;
    register_account(&http, &intruder, "standard").await;

    let review = submit_review(&http, &owner, &product_id, 4, "decent enough").await;
    let review_id = review["id"].as_str().expect("review id").to_owned();
    let base_url = engagement_base_url();

    // A different authenticated account can neither update nor delete it.
    let response = http
        .put(format!("{base_url}/reviews/{review_id}"))
        .basic_auth(&intruder, Some(TEST_PASSWORD))
        .json(&json!({ "rating": 1 }))
        .send()
        .await
        .expect("update failed");
    assert_eq!(response.status().as_u16(), 403);
    let body: Value = response.json().await.expect("not JSON");
    assert_eq!(error_kind(&body), "forbidden");

    let response = http
        .delete(format!("{base_url}/reviews/{review_id}"))
        .basic_auth(&intruder, Some(TEST_PASSWORD))
        .send()
        .await
        .expect("delete failed");
    assert_eq!(response.status().as_u16(), 403);

    // The owner can update it.
    let response = http
        .put(format!("{base_url}/reviews/{review_id}"))
        .basic_auth(&owner, Some(TEST_PASSWORD))
        .json(&json!({ "rating": 5, "comment": "grew on me" }))
        .send()
        .await
        .expect("update failed");
    assert_eq!(response.status().as_u16(), 200);
    let updated: Value = response.json().await.expect("not JSON");
    assert_eq!(updated["rating"], 5);
    assert_eq!(updated["comment"], "grew on me");

    // An admin moderates regardless of ownership; the flag is monotonic.
    let response = http
        .post(format!("{base_url}/reviews/{review_id}/moderate"))
        .basic_auth(&admin, Some(TEST_PASSWORD))
        .send()
        .await
        .expect("moderate failed");
    assert_eq!(response.status().as_u16(), 200);
    let moderated: Value = response.json().await.expect("not JSON");
    assert_eq!(moderated["moderated"], true);

    // A standard account cannot moderate.
    let response = http
        .post(format!("{base_url}/reviews/{review_id}/moderate"))
        .basic_auth(&owner, Some(TEST_PASSWORD))
        .send()
        .await
        .expect("moderate failed");
    assert_eq!(response.status().as_u16(), 403);

    // The owner deletes their review.
    let response = http
        .delete(format!("{base_url}/reviews/{review_id}"))
        .basic_auth(&owner, Some(TEST_PASSWORD))
        .send()
        .await
        .expect("delete failed");
    assert_eq!(response.status().as_u16(), 200);

    let response = http
        .get(format!("{base_url}/reviews/{review_id}/details"))
        .send()
        .await
        .expect("details failed");
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
#[ignore = "Requires running services and PostgreSQL"]
async fn test_comment_html_is_stripped() {
    let http = client();
    let (_admin, product_id) = admin_and_product(&http).await;

    let reviewer = unique_username("rev");
    register_account(&http, &reviewer, "standard").await;

    let review = submit_review(
        &http,
        &reviewer,
        &product_id,
        3,
        "<script>alert('x')</script><b>bold</b> claim",
    )
    .await;

    assert_eq!(review["comment"], "bold claim");
}

#[tokio::test]
#[ignore = "Requires running services and PostgreSQL"]
async fn test_rating_bounds_rejected() {
    let http = client();
    let (_admin, product_id) = admin_and_product(&http).await;

    let reviewer = unique_username("rev");
    register_account(&http, &reviewer, "standard").await;

    for rating in [0, 6, -1] {
        let response = http
            .post(format!("{}/reviews", engagement_base_url()))
            .basic_auth(&reviewer, Some(TEST_PASSWORD))
            .json(&json!({ "product_id": product_id, "rating": rating }))
            .send()
            .await
            .expect("submit failed");
        assert_eq!(response.status().as_u16(), 400, "rating {rating}");
        let body: Value = response.json().await.expect("not JSON");
        assert_eq!(error_kind(&body), "validation");
    }
}

#[tokio::test]
#[ignore = "Requires running services and PostgreSQL"]
async fn test_submission_requires_valid_credentials() {
    let http = client();
    let (_admin, product_id) = admin_and_product(&http).await;

    let reviewer = unique_username("rev");
    register_account(&http, &reviewer, "standard").await;

    // No credentials at all
    let response = http
        .post(format!("{}/reviews", engagement_base_url()))
        .json(&json!({ "product_id": product_id, "rating": 3 }))
        .send()
        .await
        .expect("submit failed");
    assert_eq!(response.status().as_u16(), 401);

    // Wrong password: same 401, no hint whether the account exists
    let response = http
        .post(format!("{}/reviews", engagement_base_url()))
        .basic_auth(&reviewer, Some("wrong password"))
        .json(&json!({ "product_id": product_id, "rating": 3 }))
        .send()
        .await
        .expect("submit failed");
    assert_eq!(response.status().as_u16(), 401);
    let body: Value = response.json().await.expect("not JSON");
    assert_eq!(error_kind(&body), "unauthorized");
}

#[tokio::test]
#[ignore = "Requires running services and PostgreSQL"]
async fn test_unknown_product_is_404() {
    let http = client();
    let reviewer = unique_username("rev");
    register_account(&http, &reviewer, "standard").await;

    let response = http
        .post(format!("{}/reviews", engagement_base_url()))
        .basic_auth(&reviewer, Some(TEST_PASSWORD))
        .json(&json!({
            "product_id": uuid::Uuid::new_v4().to_string(),
            "rating": 3,
        }))
        .send()
        .await
        .expect("submit failed");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
#[ignore = "Requires running services and PostgreSQL"]
async fn test_listings_and_resolved_details() {
    let http = client();
    let (_admin, product_id) = admin_and_product(&http).await;

    let reviewer = unique_username("rev");
    register_account(&http, &reviewer, "standard").await;

    let review = submit_review(&http, &reviewer, &product_id, 5, "excellent").await;
    let review_id = review["id"].as_str().expect("review id").to_owned();
    let base_url = engagement_base_url();

    let by_product: Value = http
        .get(format!("{base_url}/reviews/product/{product_id}"))
        .send()
        .await
        .expect("list failed")
        .json()
        .await
        .expect("not JSON");
    assert!(
        by_product
            .as_array()
            .expect("array")
            .iter()
            .any(|r| r["id"] == review_id.as_str())
    );

    let by_account: Value = http
        .get(format!("{base_url}/reviews/account/{reviewer}"))
        .send()
        .await
        .expect("list failed")
        .json()
        .await
        .expect("not JSON");
    assert_eq!(by_account.as_array().expect("array").len(), 1);

    let details: Value = http
        .get(format!("{base_url}/reviews/{review_id}/details"))
        .send()
        .await
        .expect("details failed")
        .json()
        .await
        .expect("not JSON");
    assert_eq!(details["reviewer"], reviewer.as_str());
    assert_eq!(details["rating"], 5);
    assert!(details["product_name"].as_str().expect("name").starts_with("reviewable_"));
}
