use jotlist_core::db::{open_db, open_db_in_memory};
use jotlist_core::{DisplayPreferences, RepoError, SqlitePreferencesRepository, Theme, DEFAULT_FONT};

#[test]
fn fresh_database_loads_defaults() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqlitePreferencesRepository::try_new(&mut conn).unwrap();

    let prefs = repo.load().unwrap();
    assert_eq!(prefs, DisplayPreferences::default());
    assert_eq!(prefs.theme, Theme::Light);
    assert_eq!(prefs.font, DEFAULT_FONT);
}

#[test]
fn saved_preferences_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs.sqlite3");
    let wanted = DisplayPreferences {
        theme: Theme::Blue,
        font: "lobster.ttf".to_string(),
    };

    {
        let mut conn = open_db(&path).unwrap();
        let mut repo = SqlitePreferencesRepository::try_new(&mut conn).unwrap();
        repo.save(&wanted).unwrap();
    }

    let mut conn = open_db(&path).unwrap();
    let repo = SqlitePreferencesRepository::try_new(&mut conn).unwrap();
    assert_eq!(repo.load().unwrap(), wanted);
}

#[test]
fn setters_overwrite_single_keys() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqlitePreferencesRepository::try_new(&mut conn).unwrap();

    repo.set_theme(Theme::Dark).unwrap();
    repo.set_font(" pacifico.ttf ").unwrap();
    repo.set_theme(Theme::Blue).unwrap();

    let prefs = repo.load().unwrap();
    assert_eq!(prefs.theme, Theme::Blue);
    assert_eq!(prefs.font, "pacifico.ttf");
}

#[test]
fn invalid_font_is_rejected_and_not_stored() {
    let mut conn = open_db_in_memory().unwrap();
    let repo = SqlitePreferencesRepository::try_new(&mut conn).unwrap();

    let err = repo.set_font("fonts/evil.ttf").unwrap_err();
    assert!(matches!(err, RepoError::InvalidPreference(_)));
    assert_eq!(repo.load().unwrap().font, DEFAULT_FONT);
}

#[test]
fn unreadable_stored_values_fall_back_to_defaults() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO preferences (key, value) VALUES ('theme', 'neon');
         INSERT INTO preferences (key, value) VALUES ('font', '   ');",
    )
    .unwrap();
    let repo = SqlitePreferencesRepository::try_new(&mut conn).unwrap();

    assert_eq!(repo.load().unwrap(), DisplayPreferences::default());
}
