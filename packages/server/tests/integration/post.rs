use serde_json::json;

use crate::common::{MAX_IMAGE_SIZE, TestApp, TestImage, routes};

mod listing {
    use super::*;

    #[tokio::test]
    async fn empty_blog_lists_no_posts() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::POSTS).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["data"], json!([]));
        assert_eq!(res.body["pagination"]["page"], 1);
        assert_eq!(res.body["pagination"]["per_page"], 10);
        assert_eq!(res.body["pagination"]["total"], 0);
        assert_eq!(res.body["pagination"]["total_pages"], 0);
    }

    #[tokio::test]
    async fn posts_are_listed_newest_first_ten_per_page() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        for i in 1..=12 {
            app.create_post(&token, &format!("Post {i}"), None).await;
        }

        let first = app.get_without_token(routes::POSTS).await;
        assert_eq!(first.status, 200);
        let data = first.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 10);
        assert_eq!(data[0]["title"], "Post 12");
        assert_eq!(data[9]["title"], "Post 3");
        assert_eq!(data[0]["author"]["username"], "alice");
        assert_eq!(first.body["pagination"]["total"], 12);
        assert_eq!(first.body["pagination"]["total_pages"], 2);

        let second = app
            .get_without_token(&format!("{}?page=2", routes::POSTS))
            .await;
        let data = second.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0]["title"], "Post 2");
        assert_eq!(data[1]["title"], "Post 1");
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        app.create_post(&token, "Only", None).await;

        let res = app
            .get_without_token(&format!("{}?page=5", routes::POSTS))
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["data"], json!([]));
        assert_eq!(res.body["pagination"]["page"], 5);
        assert_eq!(res.body["pagination"]["total"], 1);
    }

    #[tokio::test]
    async fn out_of_range_page_number_is_empty_not_an_error() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        app.create_post(&token, "Only", None).await;

        let res = app
            .get_without_token(&format!("{}?page={}", routes::POSTS, u64::MAX))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"], json!([]));
        assert_eq!(res.body["pagination"]["total"], 1);
    }

    #[tokio::test]
    async fn my_posts_only_lists_the_callers_posts() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let bob = app.create_authenticated_user("bob", "securepass").await;

        app.create_post(&alice, "Alice one", None).await;
        app.create_post(&bob, "Bob one", None).await;
        app.create_post(&alice, "Alice two", None).await;

        let res = app.get_with_token(routes::MY_POSTS, &alice).await;

        assert_eq!(res.status, 200);
        let titles: Vec<&str> = res.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Alice two", "Alice one"]);
        assert_eq!(res.body["pagination"]["total"], 2);
    }

    #[tokio::test]
    async fn my_posts_requires_a_token() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::MY_POSTS).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }
}

mod creating {
    use super::*;

    #[tokio::test]
    async fn authenticated_user_can_create_a_post_without_image() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        let res = app
            .create_post_form("Hello", "<p>World</p>", None, Some(&token))
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(res.body["id"].is_number());
        assert_eq!(res.body["title"], "Hello");
        assert_eq!(res.body["body"], "<p>World</p>");
        assert!(res.body["cover_image"].is_null());
        assert!(res.body["cover_image_url"].is_null());
        assert_eq!(res.body["author"]["username"], "alice");
        assert!(app.stored_images().is_empty());
    }

    #[tokio::test]
    async fn post_with_image_stores_file_under_derived_name() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        let res = app
            .create_post(&token, "Sunset", Some(TestImage::png("sunset.PNG")))
            .await;

        let name = res.cover_image().expect("cover_image should be set");
        assert!(name.starts_with("sunset_"), "{name}");
        assert!(name.ends_with(".png"), "{name}");
        assert_eq!(
            res.body["cover_image_url"],
            format!("/api/v1/images/{name}")
        );
        assert_eq!(app.stored_images(), vec![name.clone()]);
        assert_eq!(
            std::fs::read(app.image_path(&name)).unwrap(),
            TestImage::png("x.png").bytes
        );
    }

    #[tokio::test]
    async fn uploading_the_same_file_twice_keeps_both_images() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        let a = app
            .create_post(&token, "A", Some(TestImage::png("cover.png")))
            .await;
        let b = app
            .create_post(&token, "B", Some(TestImage::png("cover.png")))
            .await;

        assert_ne!(a.cover_image(), b.cover_image());
        assert_eq!(app.stored_images().len(), 2);
    }

    #[tokio::test]
    async fn create_requires_a_token() {
        let app = TestApp::spawn().await;

        let res = app.create_post_form("Hello", "World", None, None).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn missing_title_or_body_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        let res = app.create_post_form("", "World", None, Some(&token)).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");

        let res = app.create_post_form("Hello", "  ", None, Some(&token)).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");

        let long_title = "t".repeat(257);
        let res = app
            .create_post_form(&long_title, "World", None, Some(&token))
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn title_of_exactly_256_characters_is_accepted() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        let title = "t".repeat(256);
        let res = app.create_post_form(&title, "World", None, Some(&token)).await;

        assert_eq!(res.status, 201, "{}", res.text);
    }

    #[tokio::test]
    async fn non_image_upload_is_rejected_and_nothing_is_stored() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        let image = TestImage {
            file_name: "notes.txt",
            mime: "text/plain",
            bytes: b"hello".to_vec(),
        };
        let res = app
            .create_post_form("Hello", "World", Some(image), Some(&token))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(app.stored_images().is_empty());

        let listing = app.get_without_token(routes::POSTS).await;
        assert_eq!(listing.body["pagination"]["total"], 0);
    }

    #[tokio::test]
    async fn image_with_non_image_content_type_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        let image = TestImage {
            file_name: "cover.png",
            mime: "text/plain",
            bytes: b"hello".to_vec(),
        };
        let res = app
            .create_post_form("Hello", "World", Some(image), Some(&token))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn oversized_image_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        let image = TestImage {
            file_name: "big.png",
            mime: "image/png",
            bytes: vec![0u8; MAX_IMAGE_SIZE as usize + 1],
        };
        let res = app
            .create_post_form("Hello", "World", Some(image), Some(&token))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(app.stored_images().is_empty());
    }
}

mod reading {
    use super::*;

    #[tokio::test]
    async fn anyone_can_view_a_post() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.create_post(&token, "Hello", None).await.id();

        let res = app.get_without_token(&routes::post(id)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["id"], id);
        assert_eq!(res.body["title"], "Hello");
        assert_eq!(res.body["author"]["username"], "alice");
    }

    #[tokio::test]
    async fn missing_post_returns_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::post(999)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn owner_can_open_a_post_for_editing() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.create_post(&token, "Hello", None).await.id();

        let res = app.get_with_token(&routes::post_edit(id), &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["title"], "Hello");
        assert_eq!(res.body["author"]["username"], "alice");
    }

    #[tokio::test]
    async fn other_user_cannot_open_a_post_for_editing() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let bob = app.create_authenticated_user("bob", "securepass").await;
        let id = app.create_post(&alice, "Hello", None).await.id();

        let res = app.get_with_token(&routes::post_edit(id), &bob).await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "UNAUTHORIZED");
        assert_eq!(res.body["message"], "Unauthorized page");
    }

    #[tokio::test]
    async fn editing_a_missing_post_returns_not_found() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        let res = app.get_with_token(&routes::post_edit(42), &token).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod updating {
    use super::*;

    #[tokio::test]
    async fn owner_can_update_title_and_body_and_keep_cover() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let created = app
            .create_post(&token, "Hello", Some(TestImage::png("cover.png")))
            .await;
        let id = created.id();
        let cover = created.cover_image().unwrap();

        let res = app
            .update_post_form(id, "Hello again", "<p>Edited</p>", None, &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["title"], "Hello again");
        assert_eq!(res.body["body"], "<p>Edited</p>");
        assert_eq!(res.body["author"]["username"], "alice");
        assert_eq!(res.cover_image().as_deref(), Some(cover.as_str()));
        assert_eq!(app.stored_images(), vec![cover]);
    }

    #[tokio::test]
    async fn new_image_replaces_and_deletes_the_old_one() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let created = app
            .create_post(&token, "Hello", Some(TestImage::png("old.png")))
            .await;
        let id = created.id();
        let old = created.cover_image().unwrap();

        let res = app
            .update_post_form(id, "Hello", "World", Some(TestImage::png("new.png")), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let new = res.cover_image().unwrap();
        assert!(new.starts_with("new_"), "{new}");
        assert_eq!(app.stored_images(), vec![new]);
        assert!(!app.image_path(&old).exists());
    }

    #[tokio::test]
    async fn adding_an_image_to_a_post_without_one() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.create_post(&token, "Hello", None).await.id();

        let res = app
            .update_post_form(id, "Hello", "World", Some(TestImage::png("first.png")), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(app.stored_images(), vec![res.cover_image().unwrap()]);
    }

    #[tokio::test]
    async fn other_user_cannot_update_and_nothing_changes() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let bob = app.create_authenticated_user("bob", "securepass").await;
        let created = app
            .create_post(&alice, "Hello", Some(TestImage::png("cover.png")))
            .await;
        let id = created.id();

        let res = app
            .update_post_form(id, "Hijacked", "x", Some(TestImage::png("evil.png")), &bob)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "UNAUTHORIZED");

        let after = app.get_without_token(&routes::post(id)).await;
        assert_eq!(after.body["title"], "Hello");
        assert_eq!(app.stored_images(), vec![created.cover_image().unwrap()]);
    }

    #[tokio::test]
    async fn invalid_update_leaves_post_untouched() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.create_post(&token, "Hello", None).await.id();

        let res = app.update_post_form(id, "", "World", None, &token).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        let after = app.get_without_token(&routes::post(id)).await;
        assert_eq!(after.body["title"], "Hello");
    }

    #[tokio::test]
    async fn updating_a_missing_post_returns_not_found() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        let res = app.update_post_form(7, "Hello", "World", None, &token).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod deleting {
    use super::*;

    #[tokio::test]
    async fn owner_can_delete_a_post_and_its_image() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let created = app
            .create_post(&token, "Hello", Some(TestImage::png("cover.png")))
            .await;
        let id = created.id();

        let res = app.delete_with_token(&routes::post(id), &token).await;

        assert_eq!(res.status, 204);
        assert!(app.stored_images().is_empty());
        let after = app.get_without_token(&routes::post(id)).await;
        assert_eq!(after.status, 404);
    }

    #[tokio::test]
    async fn deleting_a_post_without_image_leaves_other_images_alone() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let with_image = app
            .create_post(&token, "Pic", Some(TestImage::png("keep.png")))
            .await;
        let plain = app.create_post(&token, "Plain", None).await.id();

        let res = app.delete_with_token(&routes::post(plain), &token).await;

        assert_eq!(res.status, 204);
        assert_eq!(app.stored_images(), vec![with_image.cover_image().unwrap()]);
    }

    #[tokio::test]
    async fn other_user_cannot_delete() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let bob = app.create_authenticated_user("bob", "securepass").await;
        let id = app.create_post(&alice, "Hello", None).await.id();

        let res = app.delete_with_token(&routes::post(id), &bob).await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "UNAUTHORIZED");
        assert_eq!(app.get_without_token(&routes::post(id)).await.status, 200);
    }

    #[tokio::test]
    async fn delete_requires_a_token() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;
        let id = app.create_post(&token, "Hello", None).await.id();

        let res = app.delete_without_token(&routes::post(id)).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn deleting_a_missing_post_returns_not_found() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice", "securepass").await;

        let res = app.delete_with_token(&routes::post(3), &token).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

#[tokio::test]
async fn full_post_lifecycle() {
    let app = TestApp::spawn().await;
    let token = app.create_authenticated_user("alice", "securepass").await;

    let created = app
        .create_post(&token, "Hello", Some(TestImage::png("a.png")))
        .await;
    let id = created.id();
    let first = created.cover_image().unwrap();

    let listing = app.get_without_token(routes::POSTS).await;
    assert_eq!(listing.body["data"][0]["id"], id);

    let updated = app
        .update_post_form(id, "Hello 2", "Body 2", Some(TestImage::png("b.png")), &token)
        .await;
    assert_eq!(updated.status, 200, "{}", updated.text);
    let second = updated.cover_image().unwrap();
    assert_ne!(first, second);
    assert_eq!(app.stored_images(), vec![second]);

    let deleted = app.delete_with_token(&routes::post(id), &token).await;
    assert_eq!(deleted.status, 204);
    assert!(app.stored_images().is_empty());

    let listing = app.get_without_token(routes::POSTS).await;
    assert_eq!(listing.body["pagination"]["total"], 0);
}
