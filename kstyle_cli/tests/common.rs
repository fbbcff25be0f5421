use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn kstyle_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("kstyle"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("KSTYLE_LOG");
	cmd
}

/// Create `templates/default` and `cache/default` below `root` and write the
/// given templates into the style directory.
#[allow(dead_code)]
pub fn write_site(root: &Path, templates: &[(&str, &str)]) -> std::io::Result<()> {
	let style_dir = root.join("templates/default");
	std::fs::create_dir_all(&style_dir)?;
	std::fs::create_dir_all(root.join("cache/default"))?;

	for (name, source) in templates {
		let path = style_dir.join(name);
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(path, source)?;
	}

	Ok(())
}
