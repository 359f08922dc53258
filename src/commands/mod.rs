use crate::cli::Command;
use crate::registry::Registry;
use crate::service::SchoolService;

pub mod list;
pub mod register;

impl Command {
    pub async fn run<R: Registry>(&self, service: &SchoolService<R>) -> anyhow::Result<()> {
        match self {
            Command::Register { .. } => register::run(self, service).await,
            Command::List { query, sort } => {
                list::run(service, query.as_deref().unwrap_or_default(), *sort).await
            }
        }
    }
}
