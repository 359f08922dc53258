#![allow(dead_code)]

use std::path::Path;

use school_registry::assets::AssetStore;
use school_registry::registry::Registry;
use school_registry::service::SchoolService;
use school_registry::types::{SchoolSubmission, UploadedAsset};
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::{ContainerRequest, GenericImage, ImageExt};

pub const MYSQL_ROOT_PASSWORD: &str = "dev";
pub const MYSQL_DATABASE: &str = "assignment";

pub fn mysql_image() -> ContainerRequest<GenericImage> {
    GenericImage::new("mysql", "8.4")
        .with_wait_for(WaitFor::message_on_stderr("port: 3306"))
        .with_exposed_port(ContainerPort::Tcp(3306))
        .with_env_var("MYSQL_ROOT_PASSWORD", MYSQL_ROOT_PASSWORD)
        .with_env_var("MYSQL_DATABASE", MYSQL_DATABASE)
}

pub fn service<R: Registry>(registry: R, assets_root: &Path) -> SchoolService<R> {
    SchoolService::new(registry, AssetStore::new(assets_root))
}

pub fn submission(name: &str, city: &str, image: &str, bytes: &[u8]) -> SchoolSubmission {
    SchoolSubmission {
        name: Some(name.to_string()),
        email: Some("office@oakhill.edu".to_string()),
        address: Some("12 Elm".to_string()),
        city: Some(city.to_string()),
        state: Some("IL".to_string()),
        contact: Some("5551234567".to_string()),
        image: Some(UploadedAsset::new(image, bytes.to_vec()).with_content_type("image/jpeg")),
    }
}
