use super::*;

fn map_file(contents: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("pixelboard-state-{}.json", uuid::Uuid::new_v4()));
    std::fs::write(&path, contents).unwrap();
    path
}

#[tokio::test]
async fn new_state_is_empty() {
    let state = test_helpers::test_app_state();
    assert!(state.areas.read().await.is_empty());
    assert!(state.sessions.read().await.is_empty());
}

#[tokio::test]
async fn from_config_without_map_has_no_areas() {
    let state = AppState::from_config(Config::default()).unwrap();
    assert!(state.areas.read().await.is_empty());
}

#[tokio::test]
async fn from_config_loads_valid_map_objects() {
    let path = map_file(
        r#"[
            {"name": "Lobby", "x": 0, "y": 0, "width": 50, "height": 40},
            {"name": "Lobby", "x": 5, "y": 5, "width": 10, "height": 10},
            {"name": "NoSize", "x": 0, "y": 0},
            {"name": "Garden", "x": 100, "y": 100, "width": 20, "height": 20}
        ]"#,
    );
    let config = Config { whiteboard_map: Some(path.clone()), ..Config::default() };
    let state = AppState::from_config(config).unwrap();
    std::fs::remove_file(&path).unwrap();

    let areas = state.areas.read().await;
    assert_eq!(areas.len(), 2);
    assert!((areas["Lobby"].bounding_box().width - 50.0).abs() < f64::EPSILON);
    assert!(areas["Garden"].canvas().is_none());
    assert!(!areas.contains_key("NoSize"));
}

#[test]
fn from_config_fails_on_unreadable_map() {
    let config = Config { whiteboard_map: Some("/nonexistent/map.json".into()), ..Config::default() };
    assert!(AppState::from_config(config).is_err());
}

#[tokio::test]
async fn seed_helpers_register_area_and_session() {
    let state = test_helpers::test_app_state();
    let id = test_helpers::seed_area(&state, "board").await;
    let (token, player) = test_helpers::seed_session(&state, "alice").await;

    assert!(state.areas.read().await.contains_key(&id));
    assert_eq!(state.sessions.read().await.get(&token), Some(&player));
}
