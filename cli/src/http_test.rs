use super::*;

#[test]
fn method_mapping() {
    assert_eq!(to_reqwest(Method::Get), reqwest::Method::GET);
    assert_eq!(to_reqwest(Method::Post), reqwest::Method::POST);
    assert_eq!(to_reqwest(Method::Put), reqwest::Method::PUT);
    assert_eq!(to_reqwest(Method::Delete), reqwest::Method::DELETE);
}

#[test]
fn base_url_trailing_slash_is_trimmed() {
    let api = HttpApi::new("http://localhost:5000/api/", Duration::from_secs(1)).unwrap();
    assert_eq!(api.base_url(), "http://localhost:5000/api");
}

#[tokio::test]
async fn unreachable_host_is_transport_error() {
    let api = HttpApi::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
    let err = AuthApi::me(&api, "tok").await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "{err:?}");
}
