//! Integration tests for the PrestaShop, VTEX, Tienda Nube and WooCommerce
//! adapters against a local `wiremock` server.

use std::time::{Duration, Instant};

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use prodex_scraper::{
    run_extraction, CatalogClient, PrestaShop, ScraperError, Source, TiendaNube, Transport, Vtex,
    WooCommerce,
};

fn test_client() -> CatalogClient {
    CatalogClient::new(5, "prodex-test/0.1", Transport::Direct)
        .expect("failed to build test CatalogClient")
}

// ---------------------------------------------------------------------------
// PrestaShop
// ---------------------------------------------------------------------------

async fn mount_prestashop_product(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .and(query_param("ws_key", "KEY"))
        .and(query_param("output_format", "JSON"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"products": [{"id": 7}]})))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/products/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"product": {
            "id": 7,
            "price": "100.000000",
            "reference": "CAM",
            "active": "1",
            "date_add": "2024-01-01 10:00:00",
            "date_upd": "2024-02-01 10:00:00",
            "manufacturer_name": "Acme",
            "name": [{"id": "1", "value": "Camisa Lino"}],
            "description": [{"id": "1", "value": "<p>Fresca</p>"}],
            "link_rewrite": [{"id": "1", "value": "camisa-lino"}],
            "associations": {
                "combinations": [{"id": "70"}, {"id": "71"}],
                "images": [{"id": "31"}]
            }
        }})))
        .expect(1)
        .mount(server)
        .await;

    for (id, delta, option) in [("70", "0.000000", "3"), ("71", "25.500000", "4")] {
        Mock::given(method("GET"))
            .and(path(format!("/api/combinations/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"combination": {
                "id": id,
                "price": delta,
                "quantity": "2",
                "reference": format!("CAM-{id}"),
                "associations": {"product_option_values": [{"id": option}]}
            }})))
            .expect(1)
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn prestashop_combinations_become_priced_variants() {
    let server = MockServer::start().await;
    mount_prestashop_product(&server).await;

    let delay = Duration::from_millis(100);
    let source = Source::PrestaShop(
        PrestaShop::new(&server.uri(), "KEY")
            .unwrap()
            .with_item_delay(delay),
    );

    let started = Instant::now();
    let catalog = run_extraction(&test_client(), &source).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(catalog.products.len(), 1);
    let product = &catalog.products[0];
    assert_eq!(product.variants.len(), 2);
    assert_eq!(product.variants[0].price, "100.00");
    assert_eq!(product.variants[1].price, "125.50");
    assert_eq!(product.variants[1].option1.as_deref(), Some("ID:4"));
    assert_eq!(product.vendor, "Acme");
    assert_eq!(
        product.images,
        vec![format!("{}/31/camisa-lino.jpg", server.uri())]
    );
    // The product request goes first; each combination waits one delay.
    assert!(
        elapsed >= delay * 2,
        "combination requests were not spaced: {elapsed:?}"
    );
}

#[tokio::test]
async fn prestashop_empty_list_yields_empty_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let source = Source::PrestaShop(PrestaShop::new(&server.uri(), "KEY").unwrap());
    let err = run_extraction(&test_client(), &source).await.unwrap_err();

    assert!(matches!(err, ScraperError::EmptyResult { .. }));
}

#[tokio::test]
async fn prestashop_rejected_key_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/products"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let source = Source::PrestaShop(PrestaShop::new(&server.uri(), "BAD").unwrap());
    let err = run_extraction(&test_client(), &source).await.unwrap_err();

    assert!(matches!(err, ScraperError::Unauthorized { .. }));
}

// ---------------------------------------------------------------------------
// VTEX
// ---------------------------------------------------------------------------

fn vtex_products(start: u32, count: u32) -> serde_json::Value {
    let products: Vec<_> = (start..start + count)
        .map(|id| {
            json!({
                "productId": id.to_string(),
                "productName": format!("Producto {id}"),
                "linkText": format!("producto-{id}"),
                "brand": "Acme",
                "categories": ["/Hogar/"],
                "items": [{
                    "itemId": format!("{id}0"),
                    "name": "Único",
                    "sellers": [{"sellerDefault": true,
                        "commertialOffer": {"Price": 10, "ListPrice": 10, "AvailableQuantity": 1}}]
                }]
            })
        })
        .collect();
    json!(products)
}

#[tokio::test]
async fn vtex_walks_offset_ranges_with_app_credentials() {
    let server = MockServer::start().await;
    for (from, to, body) in [
        ("0", "99", vtex_products(1, 100)),
        ("100", "199", vtex_products(101, 5)),
        ("200", "299", json!([])),
    ] {
        Mock::given(method("GET"))
            .and(path("/api/catalog_system/pub/products/search"))
            .and(query_param("_from", from))
            .and(query_param("_to", to))
            .and(header("X-VTEX-API-AppKey", "vtexappkey-acme"))
            .and(header("X-VTEX-API-AppToken", "secret-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;
    }

    let source = Source::Vtex(
        Vtex::new("acme", "vtexappkey-acme", "secret-token")
            .unwrap()
            .with_base_url(&server.uri()),
    );
    let catalog = run_extraction(&test_client(), &source).await.unwrap();

    assert_eq!(catalog.products.len(), 105);
    assert_eq!(catalog.store_identifier, "acme");
    assert_eq!(catalog.products[0].product_type, "Hogar");
}

// ---------------------------------------------------------------------------
// Tienda Nube
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tiendanube_treats_404_past_last_page_as_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/123456/products"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "200"))
        .and(header("Authentication", "bearer tn-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 1,
            "name": {"es": "Mate"},
            "handle": {"es": "mate"},
            "published": true,
            "tags": "regalo,  ",
            "variants": [{"id": 11, "price": "2500.00", "promotional_price": null, "values": []}]
        }])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/123456/products"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"code": 404, "message": "Last page is 1"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let source = Source::TiendaNube(
        TiendaNube::new("123456", "tn-token")
            .unwrap()
            .with_base_url(&server.uri()),
    );
    let catalog = run_extraction(&test_client(), &source).await.unwrap();

    assert_eq!(catalog.products.len(), 1);
    assert_eq!(catalog.products[0].tags, vec!["regalo"]);
    assert_eq!(catalog.store_identifier, "123456");
}

#[tokio::test]
async fn tiendanube_404_on_first_page_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let source = Source::TiendaNube(
        TiendaNube::new("999", "tn-token")
            .unwrap()
            .with_base_url(&server.uri()),
    );
    let err = run_extraction(&test_client(), &source).await.unwrap_err();

    assert!(matches!(err, ScraperError::NotFound { .. }));
}

// ---------------------------------------------------------------------------
// WooCommerce
// ---------------------------------------------------------------------------

#[tokio::test]
async fn woocommerce_fetches_variations_for_variable_products() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/products"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "100"))
        .and(query_param("consumer_key", "ck_test"))
        .and(query_param("consumer_secret", "cs_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Taza", "slug": "taza", "status": "publish",
             "regular_price": "100", "sale_price": "", "stock_status": "instock",
             "variations": []},
            {"id": 2, "name": "Playera", "slug": "playera", "status": "draft",
             "variations": [21, 22]}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/products"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/products/2/variations"))
        .and(query_param("consumer_key", "ck_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 21, "regular_price": "300", "sale_price": "250", "stock_status": "instock",
             "attributes": [{"name": "Talla", "option": "M"}]},
            {"id": 22, "regular_price": "300", "sale_price": "", "stock_status": "outofstock",
             "attributes": [{"name": "Talla", "option": "G"}]}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let source = Source::WooCommerce(WooCommerce::new(&server.uri(), "ck_test", "cs_test").unwrap());
    let catalog = run_extraction(&test_client(), &source).await.unwrap();

    assert_eq!(catalog.products.len(), 2);
    let simple = &catalog.products[0];
    assert_eq!(simple.variants.len(), 1);
    assert_eq!(simple.variants[0].price, "100");

    let variable = &catalog.products[1];
    assert_eq!(variable.variants.len(), 2);
    assert_eq!(variable.variants[0].price, "250");
    assert_eq!(variable.variants[0].compare_at_price.as_deref(), Some("300"));
    assert_eq!(variable.variants[1].title, "G");
    assert!(!variable.variants[1].available);
    assert!(!variable.is_published());
}

fn woocommerce_variations(ids: std::ops::Range<u32>) -> serde_json::Value {
    ids.map(|id| {
        json!({"id": id, "regular_price": "50", "stock_status": "instock",
               "attributes": [{"name": "Talla", "option": format!("T{id}")}]})
    })
    .collect()
}

#[tokio::test]
async fn woocommerce_pages_through_more_than_one_hundred_variations() {
    let server = MockServer::start().await;
    let declared: Vec<u32> = (1000..1130).collect();
    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/products"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 3, "name": "Tenis", "slug": "tenis", "status": "publish",
             "variations": declared}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/products"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/products/3/variations"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(woocommerce_variations(1000..1100)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/products/3/variations"))
        .and(query_param("page", "2"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(woocommerce_variations(1100..1130)))
        .expect(1)
        .mount(&server)
        .await;

    let source = Source::WooCommerce(WooCommerce::new(&server.uri(), "ck_test", "cs_test").unwrap());
    let catalog = run_extraction(&test_client(), &source).await.unwrap();

    let variants = &catalog.products[0].variants;
    assert_eq!(variants.len(), 130);
    assert_eq!(variants[0].title, "T1000");
    assert_eq!(variants[129].title, "T1129");
}
