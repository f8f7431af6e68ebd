use std::env;
use std::path::PathBuf;
use std::process;

use env_logger::Env;
use field_survey::app::App;
use field_survey::error::AppError;
use field_survey::settings::{data_root, load_settings};
use field_survey::terminal;

fn data_dir_arg() -> Result<Option<PathBuf>, AppError> {
  let mut args = env::args().skip(1);
  let mut dir = None;
  while let Some(arg) = args.next() {
    match arg.as_str() {
      "--data-dir" => {
        let value = args
          .next()
          .ok_or_else(|| AppError::Settings("--data-dir needs a path".to_string()))?;
        dir = Some(PathBuf::from(value));
      }
      other => {
        if let Some(value) = other.strip_prefix("--data-dir=") {
          dir = Some(PathBuf::from(value));
        } else {
          return Err(AppError::Settings(format!("Unknown argument: {other}")));
        }
      }
    }
  }
  Ok(dir)
}

fn start() -> Result<(), AppError> {
  let override_dir = data_dir_arg()?;
  let root = data_root(override_dir.as_deref())?;
  let settings = load_settings(&root)?;
  env_logger::Builder::from_env(Env::default().default_filter_or(settings.log_level.as_str())).init();
  log::info!("data directory {}", root.display());

  let mut app = App::open(settings)?;
  terminal::run(&mut app, &root)
}

fn main() {
  if let Err(err) = start() {
    let (_, title) = err.alert();
    eprintln!("{title}: {err}");
    log::error!("{err}");
    process::exit(1);
  }
}
