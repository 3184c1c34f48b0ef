//! Hub round trips through the real stores.

use std::sync::Arc;

use housecast_core::storage::file::write_board;
use housecast_core::timer::{Emom, Phase, TimerSpec};
use housecast_core::{
    Board, ControlCommand, Database, Day, FallbackStore, HouseId, Hub, JsonFileStore, ManualClock,
    Program, StateStore, StorageError,
};
use tempfile::TempDir;

const T0: u64 = 1_700_000_000_000;

fn house(n: u32) -> HouseId {
    HouseId::new(n).unwrap()
}

#[tokio::test]
async fn running_day_survives_a_restart() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("housecast.db");
    let clock = Arc::new(ManualClock::new(T0));

    {
        let hub = Hub::open(Box::new(Database::open_at(&db_path).unwrap()), clock.clone()).unwrap();
        hub.apply(ControlCommand::SetDay { day: Day::Wednesday })
            .await
            .unwrap();
        hub.apply(ControlCommand::UpdateTimer {
            day: Day::Wednesday,
            house: house(2),
            timer: TimerSpec::new("emom").with_param("total", 300),
        })
        .await
        .unwrap();
        hub.apply(ControlCommand::Play { day: Day::Wednesday, countdown_seconds: 1 })
            .await
            .unwrap();
        clock.advance_secs(1);
        hub.tick().await;
    }

    clock.advance_secs(75);
    let hub = Hub::open(Box::new(Database::open_at(&db_path).unwrap()), clock.clone()).unwrap();
    let snap = hub.snapshot().await;
    assert_eq!(snap.active_day, Day::Wednesday);

    let emom = &snap.houses[&house(2)];
    assert_eq!(emom.timer, Program::Emom(Emom { total: 300 }));
    assert_eq!((emom.runtime.phase, emom.runtime.remaining), (Phase::Active, Some(45)));

    let fortime = &snap.houses[&house(1)].runtime;
    assert_eq!((fortime.phase, fortime.remaining), (Phase::Active, Some(525)));
}

#[tokio::test]
async fn file_store_keeps_the_data_file_layout() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.json");
    let clock = Arc::new(ManualClock::new(T0));

    let hub = Hub::open(Box::new(JsonFileStore::new(&path)), clock).unwrap();
    hub.apply(ControlCommand::Pause { day: Day::Monday }).await.unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["activeDay"], "monday");
    assert_eq!(json["days"]["monday"]["pauseAt"], T0);
    assert_eq!(json["days"]["monday"]["houses"]["1"]["timer"]["mode"], "fortime");
    assert_eq!(json["days"]["sunday"]["countdown"]["active"], false);
}

fn database_with_file(dir: &TempDir) -> FallbackStore {
    FallbackStore::new(
        Box::new(Database::open_at(dir.path().join("housecast.db")).unwrap()),
        Box::new(JsonFileStore::new(dir.path().join("data.json"))),
    )
}

#[test]
fn empty_database_is_seeded_from_data_file() {
    let dir = TempDir::new().unwrap();
    let data_file = dir.path().join("data.json");
    let mut board = Board::default();
    board.active_day = Day::Saturday;
    write_board(&data_file, &board).unwrap();

    let mut store = database_with_file(&dir);
    assert_eq!(store.load().unwrap().map(|b| b.active_day), Some(Day::Saturday));

    // Once seeded, the database wins over later edits to the file.
    board.active_day = Day::Monday;
    write_board(&data_file, &board).unwrap();
    let mut store = database_with_file(&dir);
    assert_eq!(store.load().unwrap().map(|b| b.active_day), Some(Day::Saturday));
}

/// A database whose writes are rejected, as on a read-only volume.
struct ReadOnlyDatabase(Database);

impl StateStore for ReadOnlyDatabase {
    fn load(&mut self) -> housecast_core::error::Result<Option<Board>> {
        self.0.load()
    }

    fn save(&mut self, _board: &Board) -> housecast_core::error::Result<()> {
        Err(StorageError::QueryFailed("attempt to write a readonly database".into()).into())
    }

    fn describe(&self) -> String {
        format!("readonly {}", self.0.describe())
    }
}

#[tokio::test]
async fn failed_database_save_lands_in_data_file() {
    let dir = TempDir::new().unwrap();
    let data_file = dir.path().join("data.json");
    let clock = Arc::new(ManualClock::new(T0));
    let store = FallbackStore::new(
        Box::new(ReadOnlyDatabase(Database::open_memory().unwrap())),
        Box::new(JsonFileStore::new(&data_file)),
    );

    let hub = Hub::open(Box::new(store), clock.clone()).unwrap();
    hub.apply(ControlCommand::SetDay { day: Day::Thursday }).await.unwrap();
    drop(hub);

    let store = FallbackStore::new(
        Box::new(ReadOnlyDatabase(Database::open_memory().unwrap())),
        Box::new(JsonFileStore::new(&data_file)),
    );
    let hub = Hub::open(Box::new(store), clock).unwrap();
    assert_eq!(hub.board().await.active_day, Day::Thursday);
}

#[test]
fn partial_data_file_is_filled_in_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.json");
    std::fs::write(
        &path,
        r#"{"activeDay":"funday","days":{"friday":{"houses":{"3":{"timer":{"mode":"rounds","params":{"half":"240"}}}}}}}"#,
    )
    .unwrap();

    let board = JsonFileStore::new(&path).load().unwrap().unwrap();
    assert_eq!(board.active_day, Day::Monday);
    assert_eq!(board.days.len(), 7);
    let friday = &board.days[&Day::Friday];
    assert_eq!(friday.houses.len(), 3);
    assert_eq!(friday.houses[&house(3)].timer.blocks(), 1);
    assert_eq!(friday.houses[&house(1)].timer, Program::default());
    assert_eq!(friday.record.started_at, None);
}
