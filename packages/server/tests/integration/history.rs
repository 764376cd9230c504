use crate::common::{READINGS_CSV, TestApp, routes};

mod retention {
    use std::sync::Arc;

    use super::*;

    async fn upload_in_parallel(app: Arc<TestApp>, token: Option<String>, count: usize) {
        let mut uploads = Vec::new();
        for n in 0..count {
            let app = Arc::clone(&app);
            let token = token.clone();
            uploads.push(tokio::spawn(async move {
                let name = format!("burst{n}.csv");
                let res = match token {
                    Some(token) => app.upload_with_token(&name, READINGS_CSV, &token).await,
                    None => app.upload_without_token(&name, READINGS_CSV).await,
                };
                assert_eq!(res.status, 201, "{}", res.text);
                assert!(res.history_ids().len() <= 5);
            }));
        }
        for upload in uploads {
            upload.await.expect("upload task panicked");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_uploads_by_one_owner_keep_five() {
        let app = Arc::new(TestApp::spawn().await);
        let token = app
            .create_authenticated_user("operator", "securepass")
            .await;

        upload_in_parallel(Arc::clone(&app), Some(token.clone()), 12).await;

        let res = app.get_with_token(routes::HISTORY, &token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["total"], 5);
        assert_eq!(app.stored_file_count(), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_anonymous_uploads_keep_five() {
        let app = Arc::new(TestApp::spawn_anonymous().await);

        upload_in_parallel(Arc::clone(&app), None, 12).await;

        let res = app.get_without_token(routes::HISTORY).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["total"], 5);
        assert_eq!(app.stored_file_count(), 5);
    }

    #[tokio::test]
    async fn only_the_five_newest_uploads_are_kept() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("operator", "securepass")
            .await;

        let mut ids = Vec::new();
        for n in 0..6 {
            ids.push(
                app.upload_ok(&format!("shift{n}.csv"), READINGS_CSV, &token)
                    .await,
            );
        }

        let res = app.get_with_token(routes::HISTORY, &token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["total"], 5);

        let expected: Vec<i64> = ids[1..].iter().rev().map(|&id| id as i64).collect();
        assert_eq!(res.history_ids(), expected);

        let evicted = app
            .get_with_token(&routes::history_record(ids[0]), &token)
            .await;
        assert_eq!(evicted.status, 404);
        assert_eq!(evicted.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn evicted_uploads_lose_their_backing_files() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("operator", "securepass")
            .await;

        let first = app
            .upload_with_token("shift0.csv", READINGS_CSV, &token)
            .await;
        assert_eq!(first.status, 201, "{}", first.text);
        let first_file = first.body["record"]["file_name"]
            .as_str()
            .expect("record should carry file_name")
            .to_string();
        assert!(app.stored_file(&first_file).exists());

        for n in 1..7 {
            app.upload_ok(&format!("shift{n}.csv"), READINGS_CSV, &token)
                .await;
        }

        assert!(!app.stored_file(&first_file).exists());
        assert_eq!(app.stored_file_count(), 5);
    }

    #[tokio::test]
    async fn one_owner_does_not_evict_another() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let bob = app.create_authenticated_user("bob", "securepass").await;

        let bobs = app.upload_ok("bob.csv", READINGS_CSV, &bob).await;
        for n in 0..6 {
            app.upload_ok(&format!("alice{n}.csv"), READINGS_CSV, &alice)
                .await;
        }

        let res = app.get_with_token(routes::HISTORY, &bob).await;
        assert_eq!(res.history_ids(), [bobs as i64]);
        assert_eq!(app.stored_file_count(), 6);
    }

    #[tokio::test]
    async fn list_limit_is_clamped() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("operator", "securepass")
            .await;
        for n in 0..3 {
            app.upload_ok(&format!("shift{n}.csv"), READINGS_CSV, &token)
                .await;
        }

        let two = app
            .get_with_token(&format!("{}?limit=2", routes::HISTORY), &token)
            .await;
        assert_eq!(two.body["total"], 2);

        let zero = app
            .get_with_token(&format!("{}?limit=0", routes::HISTORY), &token)
            .await;
        assert_eq!(zero.body["total"], 1);

        let many = app
            .get_with_token(&format!("{}?limit=50", routes::HISTORY), &token)
            .await;
        assert_eq!(many.body["total"], 3);
    }
}

mod ownership {
    use super::*;

    #[tokio::test]
    async fn another_owners_record_is_not_found() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice", "securepass").await;
        let bob = app.create_authenticated_user("bob", "securepass").await;

        let id = app.upload_ok("alice.csv", READINGS_CSV, &alice).await;

        let res = app.get_with_token(&routes::history_record(id), &bob).await;
        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
        assert!(res.body.get("rows").is_none());

        let res = app
            .delete_with_token(&routes::history_record(id), &bob)
            .await;
        assert_eq!(res.status, 404);

        let still_there = app.get_with_token(&routes::history_record(id), &alice).await;
        assert_eq!(still_there.status, 200);
    }

    #[tokio::test]
    async fn history_requires_a_token_by_default() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::HISTORY).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }
}

mod replay {
    use super::*;

    #[tokio::test]
    async fn record_replays_rows_and_persisted_stats() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("operator", "securepass")
            .await;
        let uploaded = app
            .upload_with_token("readings.csv", READINGS_CSV, &token)
            .await;
        assert_eq!(uploaded.status, 201, "{}", uploaded.text);

        let res = app
            .get_with_token(&routes::history_record(uploaded.record_id()), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.statuses(), ["CRITICAL", "WARNING", "OK"]);
        assert_eq!(res.body["stats"], uploaded.body["stats"]);
        assert_eq!(res.body["rows"], uploaded.body["rows"]);
        assert_eq!(res.body["columns"], uploaded.body["columns"]);
        assert_eq!(res.body["record"]["original_name"], "readings.csv");
    }

    #[tokio::test]
    async fn missing_backing_file_is_reported_as_storage_missing() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("operator", "securepass")
            .await;
        let uploaded = app
            .upload_with_token("readings.csv", READINGS_CSV, &token)
            .await;
        assert_eq!(uploaded.status, 201, "{}", uploaded.text);

        let file_name = uploaded.body["record"]["file_name"].as_str().unwrap();
        std::fs::remove_file(app.stored_file(file_name)).unwrap();

        let res = app
            .get_with_token(&routes::history_record(uploaded.record_id()), &token)
            .await;

        assert_eq!(res.status, 500);
        assert_eq!(res.body["code"], "STORAGE_MISSING");

        let list = app.get_with_token(routes::HISTORY, &token).await;
        assert_eq!(list.status, 200);
        assert_eq!(list.body["total"], 1);
    }

    #[tokio::test]
    async fn altered_backing_file_is_an_internal_error() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("operator", "securepass")
            .await;
        let uploaded = app
            .upload_with_token("readings.csv", READINGS_CSV, &token)
            .await;
        assert_eq!(uploaded.status, 201, "{}", uploaded.text);

        let file_name = uploaded.body["record"]["file_name"].as_str().unwrap();
        std::fs::write(app.stored_file(file_name), "Pressure,Temperature\n1,1\n").unwrap();

        let res = app
            .get_with_token(&routes::history_record(uploaded.record_id()), &token)
            .await;

        assert_eq!(res.status, 500);
        assert_eq!(res.body["code"], "INTERNAL_ERROR");
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn owner_can_delete_a_record_and_its_file() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("operator", "securepass")
            .await;
        let uploaded = app
            .upload_with_token("readings.csv", READINGS_CSV, &token)
            .await;
        assert_eq!(uploaded.status, 201, "{}", uploaded.text);
        let id = uploaded.record_id();
        let file_name = uploaded.body["record"]["file_name"].as_str().unwrap();

        let res = app
            .delete_with_token(&routes::history_record(id), &token)
            .await;
        assert_eq!(res.status, 204);
        assert!(!app.stored_file(file_name).exists());

        let res = app.get_with_token(&routes::history_record(id), &token).await;
        assert_eq!(res.status, 404);

        let res = app
            .delete_with_token(&routes::history_record(id), &token)
            .await;
        assert_eq!(res.status, 404);
    }
}
