use chowbot_core::domain::intent::GuildId;
use chowbot_db::{JsonStyleRepository, JsonWishlistRepository, StyleRepository, WishlistRepository};
use serde_json::Value;
use tempfile::TempDir;

type StoreContractResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr) => {
        if !$cond {
            return Err(format!("assertion failed: `{}`", stringify!($cond)));
        }
    };
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

fn read_json(path: &std::path::Path) -> StoreContractResult<Value> {
    let raw = std::fs::read_to_string(path).map_err(|error| error.to_string())?;
    serde_json::from_str(&raw).map_err(|error| error.to_string())
}

#[tokio::test]
async fn wishlist_file_is_keyed_by_guild_id_string() -> StoreContractResult {
    let dir = TempDir::new().map_err(|error| error.to_string())?;
    let repo = JsonWishlistRepository::new(dir.path().join("wishlist.json"));

    for item in ["麵屋一燈", "鷹流拉麵", "麵屋一燈"] {
        repo.add(GuildId(1001), item).await.map_err(|error| error.to_string())?;
    }
    repo.add(GuildId(2002), "牛肉湯").await.map_err(|error| error.to_string())?;

    let json = read_json(repo.path())?;
    require!(
        json["1001"] == serde_json::json!(["麵屋一燈", "鷹流拉麵"]),
        "guild 1001 should hold two unique items in insertion order, got {}",
        json["1001"]
    );
    require!(json["2002"] == serde_json::json!(["牛肉湯"]), "guild 2002 should be isolated");
    Ok(())
}

#[tokio::test]
async fn separate_handles_observe_each_others_writes() -> StoreContractResult {
    let dir = TempDir::new().map_err(|error| error.to_string())?;
    let path = dir.path().join("wishlist.json");
    let writer = JsonWishlistRepository::new(&path);
    let reader = JsonWishlistRepository::new(&path);

    writer.add(GuildId(5), "滷肉飯").await.map_err(|error| error.to_string())?;
    writer.add(GuildId(5), "碗粿").await.map_err(|error| error.to_string())?;
    let removed = reader.remove(GuildId(5), 1).await.map_err(|error| error.to_string())?;

    require!(removed.as_deref() == Some("滷肉飯"), "first item should be removed");
    require!(writer.list(GuildId(5)).await == vec!["碗粿".to_string()]);
    Ok(())
}

#[tokio::test]
async fn style_file_round_trips_through_existing_entries() -> StoreContractResult {
    let dir = TempDir::new().map_err(|error| error.to_string())?;
    let path = dir.path().join("style.json");
    std::fs::write(&path, r#"{"9": "條列", "10": 3}"#).map_err(|error| error.to_string())?;
    let repo = JsonStyleRepository::new(&path);

    require!(repo.get(GuildId(9)).await.as_deref() == Some("條列"));
    require!(repo.get(GuildId(10)).await.as_deref() == Some("3"), "non-string styles are stringified");

    repo.set(GuildId(11), "正式").await.map_err(|error| error.to_string())?;
    let json = read_json(&path)?;
    require!(json["9"] == "條列", "existing entries must survive a write");
    require!(json["11"] == "正式");
    Ok(())
}
