use std::fs;
use std::path::{Path, PathBuf};

use tinytemplate::TinyTemplate;

const EXAMPLE_CONFIG: &str = include_str!("../config.yaml.example");
const UNIT_TEMPLATE: &str = include_str!("../systemd/kidcheck-server.service");

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("{action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unit template: {0}")]
    Template(#[from] tinytemplate::error::Error),
}

fn io_err(action: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> InstallError {
    let path = path.to_path_buf();
    move |source| InstallError::Io {
        action,
        path,
        source,
    }
}

#[derive(serde::Serialize)]
struct UnitCtx<'a> {
    binary_path: &'a str,
    config_path: &'a str,
    db_path: &'a str,
    user: &'a str,
    group: &'a str,
    working_dir: &'a str,
}

fn render_unit(ctx: &UnitCtx) -> Result<String, InstallError> {
    let mut tt = TinyTemplate::new();
    // Plain text unit file; no HTML escaping of paths
    tt.set_default_formatter(&tinytemplate::format_unescaped);
    tt.add_template("unit", UNIT_TEMPLATE)?;
    Ok(tt.render("unit", ctx)?)
}

/// Writes `contents` unless the file exists and `force` is off.
/// Returns whether the file was written.
fn write_if_absent(path: &Path, contents: &str, force: bool) -> Result<bool, InstallError> {
    if path.exists() && !force {
        eprintln!(
            "{} exists; skipping (use --force to overwrite)",
            path.display()
        );
        return Ok(false);
    }
    fs::write(path, contents).map_err(io_err("write", path))?;
    Ok(true)
}

fn ensure_parent(path: &Path) -> Result<(), InstallError> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir).map_err(io_err("create dir", dir))?;
    }
    Ok(())
}

pub struct InstallPaths<'a> {
    pub unit_path: &'a Path,
    pub config_path: &'a Path,
    pub db_path: &'a Path,
    pub binary_path: &'a Path,
    pub working_dir: &'a Path,
}

pub fn install_system(
    paths: &InstallPaths<'_>,
    user: &str,
    group: &str,
    force: bool,
) -> Result<(), InstallError> {
    ensure_parent(paths.config_path)?;
    ensure_parent(paths.unit_path)?;
    ensure_parent(paths.db_path)?;

    if write_if_absent(paths.config_path, EXAMPLE_CONFIG, force)? {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(paths.config_path, fs::Permissions::from_mode(0o640));
        }
        println!("Wrote config to {}", paths.config_path.display());
    }

    let binary_path = paths.binary_path.display().to_string();
    let config_path = paths.config_path.display().to_string();
    let db_path = paths.db_path.display().to_string();
    let working_dir = paths.working_dir.display().to_string();
    let unit_txt = render_unit(&UnitCtx {
        binary_path: &binary_path,
        config_path: &config_path,
        db_path: &db_path,
        user,
        group,
        working_dir: &working_dir,
    })?;
    if write_if_absent(paths.unit_path, &unit_txt, force)? {
        println!("Wrote unit to {}", paths.unit_path.display());
    }

    println!(
        "Done. Run: sudo systemctl daemon-reload && sudo systemctl enable --now kidcheck-server"
    );
    Ok(())
}

pub fn uninstall_system(
    unit_path: &Path,
    remove_config: bool,
    config_path: &Path,
) -> Result<(), InstallError> {
    if unit_path.exists() {
        fs::remove_file(unit_path).map_err(io_err("remove", unit_path))?;
        println!("Removed unit {}", unit_path.display());
    } else {
        println!("Unit {} not found; skipping", unit_path.display());
    }
    if remove_config {
        if config_path.exists() {
            fs::remove_file(config_path).map_err(io_err("remove", config_path))?;
            println!("Removed config {}", config_path.display());
        } else {
            println!("Config {} not found; skipping", config_path.display());
        }
    }
    println!("Run: sudo systemctl daemon-reload && sudo systemctl disable --now kidcheck-server");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_template_renders_all_fields() {
        let txt = render_unit(&UnitCtx {
            binary_path: "/usr/local/bin/kidcheck-server",
            config_path: "/etc/kidcheck/config.yaml",
            db_path: "/var/lib/kidcheck/kidcheck.db",
            user: "igreja",
            group: "igreja",
            working_dir: "/var/lib/kidcheck",
        })
        .unwrap();
        assert!(txt.contains("ExecStart=/usr/local/bin/kidcheck-server"));
        assert!(txt.contains("CONFIG_PATH=/etc/kidcheck/config.yaml"));
        assert!(txt.contains("DB_PATH=/var/lib/kidcheck/kidcheck.db"));
        assert!(txt.contains("User=igreja"));
        assert!(txt.contains("WorkingDirectory=/var/lib/kidcheck"));
    }

    #[test]
    fn example_config_parses() {
        let cfg: kidcheck_server::server::AppConfig = serde_yaml::from_str(EXAMPLE_CONFIG).unwrap();
        assert_eq!(cfg.listen_port, Some(3001));
    }

    #[test]
    fn install_then_uninstall() {
        let dir = tempfile::tempdir().unwrap();
        let unit = dir.path().join("systemd/kidcheck-server.service");
        let config = dir.path().join("etc/config.yaml");
        let db = dir.path().join("data/kidcheck.db");
        let paths = InstallPaths {
            unit_path: &unit,
            config_path: &config,
            db_path: &db,
            binary_path: Path::new("/usr/local/bin/kidcheck-server"),
            working_dir: dir.path(),
        };
        install_system(&paths, "kidcheck", "kidcheck", false).unwrap();
        assert!(unit.exists());
        assert!(config.exists());
        assert!(db.parent().unwrap().is_dir());

        // an existing config is kept without --force
        fs::write(&config, "listen_port: 9999\n").unwrap();
        install_system(&paths, "kidcheck", "kidcheck", false).unwrap();
        assert_eq!(fs::read_to_string(&config).unwrap(), "listen_port: 9999\n");

        uninstall_system(&unit, true, &config).unwrap();
        assert!(!unit.exists());
        assert!(!config.exists());
    }
}
