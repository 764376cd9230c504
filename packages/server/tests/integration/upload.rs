use crate::common::{READINGS_CSV, TestApp, routes};

mod classification {
    use super::*;

    #[tokio::test]
    async fn rows_are_classified_and_averaged() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("operator", "securepass")
            .await;

        let res = app
            .upload_with_token("readings.csv", READINGS_CSV, &token)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.statuses(), ["CRITICAL", "WARNING", "OK"]);

        let stats = &res.body["stats"];
        assert_eq!(stats["total_count"], 3);
        assert_eq!(stats["avg_pressure"], 566.67);
        assert_eq!(stats["avg_temp"], 166.67);
        assert_eq!(stats["type_distribution"]["Reactor"], 1);
        assert_eq!(stats["type_distribution"]["Pump"], 1);
        assert_eq!(stats["type_distribution"]["Valve"], 1);

        assert_eq!(
            res.body["columns"],
            serde_json::json!([
                "Equipment Name",
                "Type",
                "Flowrate",
                "Pressure",
                "Temperature",
                "Status"
            ])
        );
        assert_eq!(res.body["rows"][0]["Equipment Name"], "Reactor-1");
        assert_eq!(res.body["rows"][0]["Pressure"], 900);
        assert_eq!(res.body["rows"][0]["Flowrate"], 120.5);
    }

    #[tokio::test]
    async fn missing_temperature_column_marks_every_row_unknown() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("operator", "securepass")
            .await;

        let csv = "Type,Pressure\nPump,900\nValve,100\n";
        let res = app.upload_with_token("no_temp.csv", csv, &token).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.statuses(), ["UNKNOWN", "UNKNOWN"]);
        assert_eq!(res.body["stats"]["avg_temp"], 0.0);
        assert_eq!(res.body["stats"]["avg_pressure"], 500.0);
    }

    #[tokio::test]
    async fn missing_cells_are_empty_strings_and_count_as_zero() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("operator", "securepass")
            .await;

        let csv = "Type,Pressure,Temperature\nPump,,400\n,950,\n";
        let res = app.upload_with_token("gaps.csv", csv, &token).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.statuses(), ["OK", "WARNING"]);
        assert_eq!(res.body["rows"][0]["Pressure"], "");
        assert_eq!(res.body["rows"][1]["Type"], "");
        assert_eq!(res.body["stats"]["total_count"], 2);
    }

    #[tokio::test]
    async fn response_carries_the_callers_history() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("operator", "securepass")
            .await;

        let first = app.upload_ok("a.csv", READINGS_CSV, &token).await;
        let res = app
            .upload_with_token("b.csv", READINGS_CSV, &token)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        let second = res.record_id();
        assert_eq!(res.history_ids(), [second as i64, first as i64]);
        assert_eq!(res.body["record"]["original_name"], "b.csv");
        assert_eq!(res.body["record"]["total_records"], 3);
    }
}

mod rejection {
    use super::*;

    #[tokio::test]
    async fn request_without_file_field_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("operator", "securepass")
            .await;

        let res = app.upload_form_without_file(&token).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "NO_FILE_PROVIDED");
    }

    #[tokio::test]
    async fn empty_file_is_an_invalid_csv() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("operator", "securepass")
            .await;

        let res = app.upload_with_token("empty.csv", "", &token).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "INVALID_CSV");
        assert_eq!(
            res.body["message"],
            "Invalid CSV format: No columns to parse from file"
        );
        assert_eq!(app.stored_file_count(), 0);
    }

    #[tokio::test]
    async fn row_wider_than_header_is_an_invalid_csv() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("operator", "securepass")
            .await;

        let csv = "Pressure,Temperature\n1,2\n3,4,5\n";
        let res = app.upload_with_token("ragged.csv", csv, &token).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "INVALID_CSV");
        assert_eq!(app.stored_file_count(), 0);
    }

    #[tokio::test]
    async fn hidden_filename_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("operator", "securepass")
            .await;

        let res = app
            .upload_with_token(".readings.csv", READINGS_CSV, &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn upload_requires_a_token_by_default() {
        let app = TestApp::spawn().await;

        let res = app.upload_without_token("readings.csv", READINGS_CSV).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }
}

mod anonymous {
    use super::*;

    #[tokio::test]
    async fn anonymous_upload_is_accepted_when_enabled() {
        let app = TestApp::spawn_anonymous().await;

        let res = app.upload_without_token("readings.csv", READINGS_CSV).await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.statuses(), ["CRITICAL", "WARNING", "OK"]);

        let history = app.get_without_token(routes::HISTORY).await;
        assert_eq!(history.status, 200);
        assert_eq!(history.body["total"], 1);
    }

    #[tokio::test]
    async fn invalid_token_is_rejected_even_when_anonymous_is_enabled() {
        let app = TestApp::spawn_anonymous().await;

        let res = app
            .upload_with_token("readings.csv", READINGS_CSV, "not-a-jwt")
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn anonymous_and_authenticated_histories_are_separate() {
        let app = TestApp::spawn_anonymous().await;
        let token = app
            .create_authenticated_user("operator", "securepass")
            .await;

        let anon = app.upload_without_token("anon.csv", READINGS_CSV).await;
        assert_eq!(anon.status, 201, "{}", anon.text);
        let anon_id = anon.record_id();

        let res = app
            .get_with_token(&routes::history_record(anon_id), &token)
            .await;
        assert_eq!(res.status, 404);

        let mine = app.get_with_token(routes::HISTORY, &token).await;
        assert_eq!(mine.body["total"], 0);
    }
}
