use std::path::Path;

use fleetimage_core::FleetImageConfig;

pub fn init(path: &Path) -> anyhow::Result<()> {
    let output = path.join("fleetimage.toml");
    if output.exists() {
        anyhow::bail!("{} already exists", output.display());
    }
    std::fs::write(&output, FleetImageConfig::default().to_toml_string()?)?;
    println!("✓ Generated {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_loadable_defaults() {
        let dir = tempfile::tempdir().unwrap();
        init(dir.path()).unwrap();

        let loaded = FleetImageConfig::from_file(&dir.path().join("fleetimage.toml")).unwrap();
        assert_eq!(loaded, FleetImageConfig::default());
    }

    #[test]
    fn refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        init(dir.path()).unwrap();
        assert!(init(dir.path()).is_err());
    }
}
