use modtpl::generator::{Generator, Settings, TemplateInputs};
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::new("debug")).init();

    let mut inputs = TemplateInputs::default();
    inputs.raw.insert("template/raw/.gitignore".into(), "build/\nrun/\n".into());
    inputs.interpolated.insert(
        "template/interpolated/gradle.properties".into(),
        "minecraft_version={{ minecraft_version }}\nneo_version={{ neo_version }}\nmod_id={{ mod_id }}\nmod_group_id={{ mod_group_id }}\n".into(),
    );

    for (version, neo_version) in [("1.20.6", "20.6.119"), ("1.21.4", "21.4.38-beta")] {
        let settings = Settings {
            mod_name: "Example Mod".into(),
            mod_id: "examplemod".into(),
            package_name: "com.example.examplemod".into(),
            minecraft_version: version.into(),
        };
        let files = Generator::new(settings)?
            .with_var("neo_version", neo_version)
            .generate_template(&inputs)?;
        for (path, contents) in files {
            println!("==> {} ({}) <==", path, version);
            println!("{}", contents);
        }
    }
    Ok(())
}
