use axum::http::{StatusCode, header};
use axum_test::{
    TestServer,
    multipart::{MultipartForm, Part},
};
use serde_json::{Value, json};
use sqlx::sqlite::SqlitePoolOptions;

use foodstation_backend::{
    common::spreadsheet::{CellValue, Sheet, XLSX_CONTENT_TYPE, write_xlsx},
    config::{AdminSeed, AppState, Settings, connect_pool},
    create_app,
    models::{consumption::CreateConsumptionPayload, product::CreateProductPayload},
};

const ADMIN_MATRICULA: &str = "admin";
const ADMIN_PASSWORD: &str = "admin123";

struct TestApp {
    server: TestServer,
    admin_token: String,
}

fn test_settings() -> Settings {
    let upload_dir = std::env::temp_dir().join(format!("foodstation-test-{}", uuid::Uuid::new_v4()));
    Settings {
        database_url: "sqlite::memory:".into(),
        database_max_connections: 1,
        jwt_secret: "segredo-de-teste".into(),
        jwt_ttl_hours: 1,
        cookie_secure: false,
        upload_dir: upload_dir.to_string_lossy().into_owned(),
        max_upload_bytes: 5 * 1024 * 1024,
        bind_addr: "127.0.0.1:0".into(),
        cors_origin: None,
        admin_seed: Some(AdminSeed {
            matricula: ADMIN_MATRICULA.into(),
            password: ADMIN_PASSWORD.into(),
            full_name: "Administrador".into(),
        }),
    }
}

async fn spawn_app() -> TestApp {
    // Uma única conexão: o banco em memória vive enquanto ela existir.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();

    let settings = test_settings();
    let seed = settings.admin_seed.clone().unwrap();
    let state = AppState::with_pool(pool, settings);
    state.auth_service.seed_admin(&seed).await.unwrap();

    let server = TestServer::new(create_app(state)).unwrap();
    let admin_token = login(&server, ADMIN_MATRICULA, Some(ADMIN_PASSWORD)).await;
    TestApp { server, admin_token }
}

async fn login(server: &TestServer, matricula: &str, password: Option<&str>) -> String {
    let response = server
        .post("/api/auth/login")
        .json(&json!({ "matricula": matricula, "password": password }))
        .await;
    response.assert_status_ok();
    response.json::<Value>()["token"].as_str().unwrap().to_string()
}

impl TestApp {
    async fn create_user(&self, matricula: &str, monthly_limit: Option<f64>) -> (String, String) {
        let response = self
            .server
            .post("/api/users")
            .authorization_bearer(&self.admin_token)
            .json(&json!({
                "fullName": format!("Usuário {matricula}"),
                "matricula": matricula,
                "monthlyLimit": monthly_limit,
                "limitEnabled": monthly_limit.is_some(),
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let id = response.json::<Value>()["id"].as_str().unwrap().to_string();
        let token = login(&self.server, matricula, None).await;
        (id, token)
    }

    async fn create_product(&self, body: Value) -> Value {
        let response = self
            .server
            .post("/api/products")
            .authorization_bearer(&self.admin_token)
            .json(&body)
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Value>()
    }

    async fn get_product(&self, id: &str) -> Value {
        let response = self
            .server
            .get(&format!("/api/products/{id}"))
            .authorization_bearer(&self.admin_token)
            .await;
        response.assert_status_ok();
        response.json::<Value>()
    }
}

#[tokio::test]
async fn admin_needs_password_but_users_log_in_by_matricula() {
    let app = spawn_app().await;

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "matricula": ADMIN_MATRICULA }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "matricula": ADMIN_MATRICULA, "password": "errada" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let (_, token) = app.create_user("100234", None).await;
    let response = app.server.get("/api/auth/me").authorization_bearer(&token).await;
    response.assert_status_ok();
    let me = response.json::<Value>();
    assert_eq!(me["matricula"], "100234");
    assert_eq!(me["role"], "user");
    assert!(me.get("passwordHash").is_none());

    let response = app
        .server
        .post("/api/auth/login")
        .json(&json!({ "matricula": "nao-existe" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_token_and_admin_routes_require_admin() {
    let app = spawn_app().await;
    app.server.get("/api/products").await.assert_status(StatusCode::UNAUTHORIZED);
    app.server
        .get("/api/products")
        .authorization_bearer("token-invalido")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let (_, token) = app.create_user("200", None).await;
    for path in ["/api/users", "/api/reports/dashboard", "/api/stock-transactions"] {
        app.server
            .get(path)
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
    app.server
        .post("/api/sectors")
        .authorization_bearer(&token)
        .json(&json!({ "name": "Copa" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.server.get("/api/health").await.assert_status_ok();
}

#[tokio::test]
async fn stock_never_goes_negative_and_counters_stay_consistent() {
    let app = spawn_app().await;
    let product = app
        .create_product(json!({ "name": "Biscoito", "unitPrice": 1.5, "stockQuantity": 5 }))
        .await;
    let id = product["id"].as_str().unwrap();
    assert_eq!(product["stockQuantity"], 5);
    assert_eq!(product["totalIn"], 5);

    let response = app
        .server
        .post("/api/stock-transactions")
        .authorization_bearer(&app.admin_token)
        .json(&json!({ "productId": id, "change": -10 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(app.get_product(id).await["stockQuantity"], 5);

    let response = app
        .server
        .post("/api/stock-transactions")
        .authorization_bearer(&app.admin_token)
        .json(&json!({ "productId": id, "change": -3, "reason": "Quebra" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let transaction = response.json::<Value>();
    assert_eq!(transaction["transactionType"], "saida");

    let product = app.get_product(id).await;
    assert_eq!(product["stockQuantity"], 2);
    assert_eq!(product["totalIn"], 5);
    assert_eq!(product["totalOut"], 3);

    // Consumir mais do que há em estoque falha sem efeito colateral.
    let response = app
        .server
        .post("/api/consumptions")
        .authorization_bearer(&app.admin_token)
        .json(&json!({ "productId": id, "qty": 3 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(app.get_product(id).await["stockQuantity"], 2);

    // Desfazer a saída devolve o estoque.
    let tx_id = transaction["id"].as_str().unwrap();
    app.server
        .delete(&format!("/api/stock-transactions/{tx_id}"))
        .authorization_bearer(&app.admin_token)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    let product = app.get_product(id).await;
    assert_eq!(product["stockQuantity"], 5);
    assert_eq!(product["totalOut"], 0);
}

#[tokio::test]
async fn consumption_price_is_frozen_and_edits_adjust_stock() {
    let app = spawn_app().await;
    let product = app
        .create_product(json!({ "name": "Café", "unitPrice": 2.5, "stockQuantity": 10 }))
        .await;
    let id = product["id"].as_str().unwrap();
    let (_, token) = app.create_user("300", Some(100.0)).await;

    let response = app
        .server
        .post("/api/consumptions")
        .authorization_bearer(&token)
        .json(&json!({ "productId": id, "qty": 2 }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let consumption = response.json::<Value>();
    assert_eq!(consumption["totalPrice"], 5.0);
    let consumption_id = consumption["id"].as_str().unwrap();

    app.server
        .put(&format!("/api/products/{id}"))
        .authorization_bearer(&app.admin_token)
        .json(&json!({ "unitPrice": 4.0 }))
        .await
        .assert_status_ok();

    let response = app.server.get("/api/consumptions").authorization_bearer(&token).await;
    response.assert_status_ok();
    let list = response.json::<Value>();
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["unitPrice"], 2.5);
    assert_eq!(list[0]["totalPrice"], 5.0);

    // Edição recalcula com o preço congelado e ajusta o estoque pela diferença.
    let response = app
        .server
        .put(&format!("/api/consumptions/{consumption_id}"))
        .authorization_bearer(&app.admin_token)
        .json(&json!({ "qty": 3 }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["totalPrice"], 7.5);
    let product = app.get_product(id).await;
    assert_eq!(product["stockQuantity"], 7);
    assert_eq!(product["totalOut"], 3);

    let response = app
        .server
        .get("/api/consumptions/me/summary")
        .authorization_bearer(&token)
        .await;
    response.assert_status_ok();
    let summary = response.json::<Value>();
    assert_eq!(summary["monthQty"], 3);
    assert_eq!(summary["monthTotal"], 7.5);
    assert_eq!(summary["remaining"], 92.5);

    app.server
        .delete(&format!("/api/consumptions/{consumption_id}"))
        .authorization_bearer(&app.admin_token)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    let product = app.get_product(id).await;
    assert_eq!(product["stockQuantity"], 10);
    assert_eq!(product["totalOut"], 0);
}

#[tokio::test]
async fn users_cannot_consume_for_others_or_see_hidden_products() {
    let app = spawn_app().await;
    let visible = app
        .create_product(json!({ "name": "Chá", "unitPrice": 1.0, "stockQuantity": 10 }))
        .await;
    let hidden = app
        .create_product(json!({
            "name": "Reserva",
            "unitPrice": 1.0,
            "stockQuantity": 10,
            "visible": false
        }))
        .await;
    let (other_id, _) = app.create_user("401", None).await;
    let (_, token) = app.create_user("402", None).await;

    app.server
        .post("/api/consumptions")
        .authorization_bearer(&token)
        .json(&json!({ "productId": visible["id"], "qty": 1, "userId": other_id }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.server
        .post("/api/consumptions")
        .authorization_bearer(&token)
        .json(&json!({ "productId": hidden["id"], "qty": 1 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let response = app.server.get("/api/products").authorization_bearer(&token).await;
    response.assert_status_ok();
    let names: Vec<String> = response
        .json::<Value>()
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Chá".to_string()]);

    // Administrador pode lançar em nome de outro usuário.
    let response = app
        .server
        .post("/api/consumptions")
        .authorization_bearer(&app.admin_token)
        .json(&json!({ "productId": visible["id"], "qty": 1, "userId": other_id }))
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["userId"], other_id.as_str());
}

#[tokio::test]
async fn product_with_consumptions_cannot_be_deleted() {
    let app = spawn_app().await;
    let product = app
        .create_product(json!({ "name": "Água", "unitPrice": 1.0, "stockQuantity": 4 }))
        .await;
    let id = product["id"].as_str().unwrap();

    app.server
        .post("/api/consumptions")
        .authorization_bearer(&app.admin_token)
        .json(&json!({ "productId": id, "qty": 1 }))
        .await
        .assert_status(StatusCode::CREATED);

    app.server
        .delete(&format!("/api/products/{id}"))
        .authorization_bearer(&app.admin_token)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    assert_eq!(app.get_product(id).await["stockQuantity"], 3);
    let response = app
        .server
        .get("/api/consumptions")
        .authorization_bearer(&app.admin_token)
        .await;
    assert_eq!(response.json::<Value>().as_array().unwrap().len(), 1);

    // Sem consumos a exclusão passa.
    let free = app.create_product(json!({ "name": "Copo", "unitPrice": 0.1 })).await;
    let free_id = free["id"].as_str().unwrap();
    app.server
        .delete(&format!("/api/products/{free_id}"))
        .authorization_bearer(&app.admin_token)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    app.server
        .get(&format!("/api/products/{free_id}"))
        .authorization_bearer(&app.admin_token)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_with_consumption_history_cannot_be_deleted() {
    let app = spawn_app().await;
    let (user_id, _) = app.create_user("300", None).await;
    let product = app
        .create_product(json!({ "name": "Suco", "unitPrice": 3.0, "stockQuantity": 2 }))
        .await;

    app.server
        .post("/api/consumptions")
        .authorization_bearer(&app.admin_token)
        .json(&json!({ "productId": product["id"], "qty": 1, "userId": user_id }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = app
        .server
        .delete(&format!("/api/users/{user_id}"))
        .authorization_bearer(&app.admin_token)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(!response.json::<Value>()["message"].as_str().unwrap().is_empty());

    app.server
        .get(&format!("/api/users/{user_id}"))
        .authorization_bearer(&app.admin_token)
        .await
        .assert_status_ok();

    // Sem histórico a exclusão passa.
    let (free_id, _) = app.create_user("301", None).await;
    app.server
        .delete(&format!("/api/users/{free_id}"))
        .authorization_bearer(&app.admin_token)
        .await
        .assert_status(StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn monthly_limit_can_be_cleared_with_null() {
    let app = spawn_app().await;
    let (user_id, token) = app.create_user("400", Some(50.0)).await;

    // Campo ausente mantém o limite.
    let response = app
        .server
        .put(&format!("/api/users/{user_id}"))
        .authorization_bearer(&app.admin_token)
        .json(&json!({ "fullName": "Maria" }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["monthlyLimit"], 50.0);

    let response = app
        .server
        .put(&format!("/api/users/{user_id}"))
        .authorization_bearer(&app.admin_token)
        .json(&json!({ "monthlyLimit": null }))
        .await;
    response.assert_status_ok();
    assert!(response.json::<Value>()["monthlyLimit"].is_null());

    let summary = app
        .server
        .get("/api/consumptions/me/summary")
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert!(summary["remaining"].is_null());

    app.server
        .put(&format!("/api/users/{user_id}"))
        .authorization_bearer(&app.admin_token)
        .json(&json!({ "monthlyLimit": -5 }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_consumptions_on_one_product_are_serialized() {
    // Banco em arquivo com várias conexões, como em produção.
    let dir = std::env::temp_dir().join(format!("foodstation-db-{}", uuid::Uuid::new_v4()));
    let url = format!("sqlite://{}", dir.join("foodstation.db").display());
    let pool = connect_pool(&url, 5).await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    let state = AppState::with_pool(pool, test_settings());

    let admin = state
        .user_service
        .create(
            serde_json::from_value(json!({
                "fullName": "Gerente",
                "matricula": "gerente",
                "password": "segredo1",
                "role": "admin",
            }))
            .unwrap(),
        )
        .await
        .unwrap();

    let create_product = |name: &str, stock: i64| {
        let payload: CreateProductPayload = serde_json::from_value(json!({
            "name": name,
            "unitPrice": 2.0,
            "stockQuantity": stock,
        }))
        .unwrap();
        let state = state.clone();
        let admin_id = admin.id;
        async move { state.product_service.create(payload.into(), Some(admin_id)).await.unwrap() }
    };

    let consume_all = |product_id: uuid::Uuid, times: usize| {
        let handles: Vec<_> = (0..times)
            .map(|_| {
                let state = state.clone();
                let admin = admin.clone();
                tokio::spawn(async move {
                    let payload = CreateConsumptionPayload { product_id, qty: 1, user_id: None };
                    state.consumption_service.create(&payload, &admin).await
                })
            })
            .collect();
        async move {
            let mut results = Vec::with_capacity(handles.len());
            for handle in handles {
                results.push(handle.await.unwrap());
            }
            results
        }
    };

    // Estoque de sobra: todos os lançamentos passam.
    let coffee = create_product("Café", 1000).await;
    let results = consume_all(coffee.id, 40).await;
    let failures: Vec<String> = results
        .iter()
        .filter_map(|r| r.as_ref().err().map(|e| e.to_string()))
        .collect();
    assert!(failures.is_empty(), "falhas: {failures:?}");
    let coffee = state.product_service.get(coffee.id).await.unwrap();
    assert_eq!(coffee.stock_quantity, 960);
    assert_eq!(coffee.total_out, 40);

    // Estoque curto: exatamente o disponível passa, o resto é estoque insuficiente.
    let tea = create_product("Chá", 10).await;
    let results = consume_all(tea.id, 20).await;
    let ok = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(ok, 10);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(err.status(), StatusCode::BAD_REQUEST, "{err}");
    }
    let tea = state.product_service.get(tea.id).await.unwrap();
    assert_eq!(tea.stock_quantity, 0);
    assert_eq!(tea.total_out, 10);

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn bulk_import_reports_bad_rows_and_imports_the_rest() {
    let app = spawn_app().await;
    app.server
        .post("/api/sectors")
        .authorization_bearer(&app.admin_token)
        .json(&json!({ "name": "Copa" }))
        .await
        .assert_status(StatusCode::CREATED);

    let mut sheet = Sheet::new("Produtos", vec!["Nome", "Preço", "Quantidade", "Setor"]);
    sheet.push(vec!["Suco".into(), 3.5.into(), 12_i64.into(), "copa".into()]);
    sheet.push(vec![CellValue::Empty, 2.0.into(), 1_i64.into(), CellValue::Empty]);
    sheet.push(vec!["Bolacha".into(), 1.25.into(), 8_i64.into(), CellValue::Empty]);
    sheet.push(vec!["Pão".into(), 0.8.into(), 5_i64.into(), "Padaria".into()]);
    let bytes = write_xlsx(&[sheet]).unwrap();

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(bytes).file_name("produtos.xlsx").mime_type(XLSX_CONTENT_TYPE),
    );
    let response = app
        .server
        .post("/api/products/bulk-import")
        .authorization_bearer(&app.admin_token)
        .multipart(form)
        .await;
    response.assert_status_ok();
    let result = response.json::<Value>();
    assert_eq!(result["imported"], 2);
    let errors: Vec<&str> = result["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e.as_str().unwrap())
        .collect();
    assert_eq!(errors.len(), 2);
    assert!(errors[0].starts_with("Linha 3:"));
    assert_eq!(errors[1], "Linha 5: Setor 'Padaria' não encontrado");

    let response = app
        .server
        .get("/api/products")
        .authorization_bearer(&app.admin_token)
        .await;
    let products = response.json::<Value>();
    let suco = products
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["name"] == "Suco")
        .unwrap();
    assert_eq!(suco["stockQuantity"], 12);
    assert_eq!(suco["sectorName"], "Copa");

    // Estoque inicial vira uma entrada no histórico.
    let response = app
        .server
        .get("/api/stock-transactions")
        .authorization_bearer(&app.admin_token)
        .await;
    assert_eq!(response.json::<Value>().as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn bulk_import_rejects_unsupported_files() {
    let app = spawn_app().await;
    let form = MultipartForm::new()
        .add_part("file", Part::bytes(b"nome;preco".to_vec()).file_name("produtos.txt"));
    app.server
        .post("/api/products/bulk-import")
        .authorization_bearer(&app.admin_token)
        .multipart(form)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn predictive_report_leaves_unconsumed_products_without_forecast() {
    let app = spawn_app().await;
    let idle = app
        .create_product(json!({ "name": "Parado", "unitPrice": 1.0, "stockQuantity": 50 }))
        .await;
    let busy = app
        .create_product(json!({ "name": "Popular", "unitPrice": 1.0, "stockQuantity": 30 }))
        .await;
    app.server
        .post("/api/consumptions")
        .authorization_bearer(&app.admin_token)
        .json(&json!({ "productId": busy["id"], "qty": 15 }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = app
        .server
        .get("/api/reports/predictive?window_days=30")
        .authorization_bearer(&app.admin_token)
        .await;
    response.assert_status_ok();
    let report = response.json::<Value>();
    let products = report["products"].as_array().unwrap();
    assert_eq!(products.len(), 2);

    // Quem acaba primeiro vem primeiro.
    assert_eq!(products[0]["productId"], busy["id"]);
    assert_eq!(products[0]["avgDailyConsumption"], 0.5);
    assert_eq!(products[0]["daysUntilStockout"], 30.0);

    assert_eq!(products[1]["productId"], idle["id"]);
    assert!(products[1]["daysUntilStockout"].is_null());
    assert_eq!(products[1]["status"], "no_consumption");
}

#[tokio::test]
async fn reports_and_exports_respond() {
    let app = spawn_app().await;
    let product = app
        .create_product(json!({ "name": "Cápsula", "unitPrice": 2.0, "stockQuantity": 20 }))
        .await;
    let (user_id, token) = app.create_user("500", Some(10.0)).await;
    app.server
        .post("/api/consumptions")
        .authorization_bearer(&token)
        .json(&json!({ "productId": product["id"], "qty": 5 }))
        .await
        .assert_status(StatusCode::CREATED);

    for path in [
        "/api/reports/dashboard",
        "/api/reports/low-stock",
        "/api/reports/top-consumed",
        "/api/reports/sectors",
        "/api/reports/coffee-machine?cadence=weekly",
        "/api/reports/consumption-control",
        "/api/products/low-stock",
        "/api/consumptions/recent?limit=5",
    ] {
        app.server
            .get(path)
            .authorization_bearer(&app.admin_token)
            .await
            .assert_status_ok();
    }

    let response = app
        .server
        .get("/api/reports/consumption-control")
        .authorization_bearer(&app.admin_token)
        .await;
    let report = response.json::<Value>();
    let entry = report["users"]
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["userId"] == user_id.as_str())
        .unwrap();
    assert_eq!(entry["totalValue"], 10.0);
    assert_eq!(entry["status"], "near_limit");

    for path in [
        "/api/consumptions/export",
        "/api/reports/foodstation/export?mode=consolidated",
        "/api/reports/foodstation/export?mode=detailed",
    ] {
        let response = app
            .server
            .get(path)
            .authorization_bearer(&app.admin_token)
            .await;
        response.assert_status_ok();
        assert_eq!(response.header(header::CONTENT_TYPE), XLSX_CONTENT_TYPE);
        let disposition = response.header(header::CONTENT_DISPOSITION);
        assert!(disposition.to_str().unwrap().contains(".xlsx"));
        assert!(!response.as_bytes().is_empty());
    }
}
