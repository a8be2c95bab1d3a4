use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::TemplateError;
use crate::template_manager::template_mgr;
use crate::tpl::RenderContext;
use crate::tpl::engine::render_template;

/// Rendered output path -> file contents.
pub type GeneratedTemplate = BTreeMap<String, String>;

/// Project files keyed by their source path. Every key must contain its
/// folder marker (`raw/` or `interpolated/`); the output path is whatever
/// follows the first occurrence of the marker.
#[derive(Debug, Clone, Default)]
pub struct TemplateInputs {
    /// Copied to the output unchanged.
    pub raw: BTreeMap<String, String>,
    /// Rendered against the generator context.
    pub interpolated: BTreeMap<String, String>,
}

/// Yields `(output path, contents)` for every entry of `files`.
fn strip_folder_marker<'a>(
    files: &'a BTreeMap<String, String>,
    marker: &'a str,
) -> impl Iterator<Item = Result<(&'a str, &'a str), TemplateError>> + 'a {
    files.iter().map(move |(key, contents)| {
        let start = key
            .find(marker)
            .ok_or_else(|| TemplateError::Load(format!("Missing {} in {}", marker, key)))?;
        Ok((&key[start + marker.len()..], contents.as_str()))
    })
}

/// Minecraft release number, `major.minor[.patch]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct McVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// Oldest release the bundled templates support.
pub const MIN_SUPPORTED: McVersion = McVersion::new(1, 20, 2);

/// Releases at which the templates change shape. Each one yields a
/// `before_X` / `from_X` flag pair.
pub const VERSION_THRESHOLDS: [McVersion; 1] = [McVersion::new(1, 21, 1)];

impl McVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    pub fn parse(s: &str) -> Result<Self, TemplateError> {
        let invalid = || TemplateError::UnsupportedVersion(format!("'{}' is not a release number", s));
        let parts = s
            .trim()
            .split('.')
            .map(|p| p.parse::<u32>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;
        match parts[..] {
            [major, minor] => Ok(Self::new(major, minor, 0)),
            [major, minor, patch] => Ok(Self::new(major, minor, patch)),
            _ => Err(invalid()),
        }
    }

    /// `1.21.1` -> `1_21_1`
    pub fn flag_suffix(&self) -> String {
        self.to_string().replace('.', "_")
    }
}

impl fmt::Display for McVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.patch == 0 {
            write!(f, "{}.{}", self.major, self.minor)
        } else {
            write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
        }
    }
}

impl FromStr for McVersion {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// `before_X` is set when `version < X`, `from_X` when `version >= X`.
pub fn version_flags(version: McVersion, thresholds: &[McVersion]) -> Vec<(String, bool)> {
    thresholds
        .iter()
        .flat_map(|t| {
            let suffix = t.flag_suffix();
            [
                (format!("before_{}", suffix), version < *t),
                (format!("from_{}", suffix), version >= *t),
            ]
        })
        .collect()
}

/// Java class name derived from the display name: every character outside
/// `[A-Za-z0-9]` is dropped.
pub fn mod_class_name(mod_name: &str) -> String {
    mod_name.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub mod_name: String,
    pub mod_id: String,
    pub package_name: String,
    pub minecraft_version: String,
}

impl Settings {
    pub fn java_folder(&self) -> String {
        format!("src/main/java/{}", self.package_name.replace('.', "/"))
    }
}

/// Renders the bundled templates for one mod.
pub struct Generator {
    settings: Settings,
    version: McVersion,
    ctx: RenderContext,
    profile: Option<String>,
}

impl Generator {
    pub fn new(settings: Settings) -> Result<Self, TemplateError> {
        let version = McVersion::parse(&settings.minecraft_version)?;
        if version < MIN_SUPPORTED {
            return Err(TemplateError::UnsupportedVersion(format!(
                "{} is older than {}",
                version, MIN_SUPPORTED
            )));
        }

        let class_name = mod_class_name(&settings.mod_name);
        if class_name.is_empty() {
            return Err(TemplateError::Context(format!(
                "mod name '{}' has no characters usable in a class name",
                settings.mod_name
            )));
        }

        let mut ctx = RenderContext::new()
            .var("mod_id", settings.mod_id.as_str())
            .var("mod_name", settings.mod_name.as_str())
            .var("package_name", settings.package_name.as_str())
            .var("mod_group_id", settings.package_name.as_str())
            .var("mod_class_name", class_name)
            .var("minecraft_version", version.to_string());
        ctx.extend_flags(version_flags(version, &VERSION_THRESHOLDS));

        template_mgr().load_bundled()?;
        debug!(mod_id = %settings.mod_id, %version, "generator ready");

        Ok(Self {
            settings,
            version,
            ctx,
            profile: None,
        })
    }

    /// Selects the template variant profile used by every render.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Binds an extra variable, e.g. `neo_version` or `mdg_version`, for
    /// interpolated project files.
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.ctx.set_var(name, value);
        self
    }

    pub fn version(&self) -> McVersion {
        self.version
    }

    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    pub fn render(&self, template_id: &str) -> Result<String, TemplateError> {
        template_mgr().render(template_id, self.profile.as_deref(), &self.ctx)
    }

    /// Renders the version-dependent client classes. From 1.21.1 the client
    /// code lives in its own `<ModClass>Client` class; before that it is a
    /// `ClientModEvents` fragment nested inside the main mod class.
    pub fn generate_special(&self) -> Result<GeneratedTemplate, TemplateError> {
        let java_folder = self.settings.java_folder();
        let class_name = mod_class_name(&self.settings.mod_name);
        let mut ret = GeneratedTemplate::new();

        if self.ctx.get_flag("from_1_21_1") == Some(true) {
            ret.insert(
                format!("{}/{}Client.java", java_folder, class_name),
                self.render("special.ModClassClient")?,
            );
        }
        if self.ctx.get_flag("before_1_21_1") == Some(true) {
            ret.insert(
                format!("{}/ClientModEvents.java.fragment", java_folder),
                self.render("special.ClientModEvents")?,
            );
        }

        info!(
            "Generated {} special file(s) for {} ({})",
            ret.len(),
            self.settings.mod_id,
            self.version
        );
        Ok(ret)
    }

    /// Builds the whole project: raw files copied, interpolated files
    /// rendered, then the version-dependent special files. Fails without
    /// partial output on the first bad key or render error.
    pub fn generate_template(&self, inputs: &TemplateInputs) -> Result<GeneratedTemplate, TemplateError> {
        let mut ret = GeneratedTemplate::new();

        for entry in strip_folder_marker(&inputs.raw, "raw/") {
            let (path, contents) = entry?;
            ret.insert(path.to_string(), contents.to_string());
        }

        for entry in strip_folder_marker(&inputs.interpolated, "interpolated/") {
            let (path, contents) = entry?;
            let rendered = render_template(&format!("interpolated:{}", path), contents, &self.ctx)?;
            ret.insert(path.to_string(), rendered);
        }

        let raw_count = inputs.raw.len();
        let interpolated_count = inputs.interpolated.len();
        ret.extend(self.generate_special()?);

        info!(
            raw = raw_count,
            interpolated = interpolated_count,
            total = ret.len(),
            "Generated project for {}",
            self.settings.mod_id
        );
        Ok(ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(version: &str) -> Settings {
        Settings {
            mod_name: "My Cool Mod!".into(),
            mod_id: "mycoolmod".into(),
            package_name: "com.example.mycoolmod".into(),
            minecraft_version: version.into(),
        }
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(McVersion::parse("1.21.1").unwrap(), McVersion::new(1, 21, 1));
        assert_eq!(McVersion::parse("1.21").unwrap(), McVersion::new(1, 21, 0));
        assert_eq!("1.20.6".parse::<McVersion>().unwrap(), McVersion::new(1, 20, 6));
        assert!(McVersion::parse("1").is_err());
        assert!(McVersion::parse("1.21.x").is_err());
        assert!(McVersion::parse("1.2.3.4").is_err());
        assert!(McVersion::parse("").is_err());
    }

    #[test]
    fn test_version_order_and_display() {
        assert!(McVersion::new(1, 20, 6) < McVersion::new(1, 21, 0));
        assert!(McVersion::new(1, 21, 0) < McVersion::new(1, 21, 1));
        assert!(McVersion::new(1, 21, 10) > McVersion::new(1, 21, 9));
        assert_eq!(McVersion::new(1, 21, 0).to_string(), "1.21");
        assert_eq!(McVersion::new(1, 21, 1).flag_suffix(), "1_21_1");
    }

    #[test]
    fn test_version_flags() {
        let flags = |v: &str| version_flags(McVersion::parse(v).unwrap(), &VERSION_THRESHOLDS);
        assert_eq!(
            flags("1.21"),
            vec![("before_1_21_1".to_string(), true), ("from_1_21_1".to_string(), false)]
        );
        assert_eq!(
            flags("1.21.1"),
            vec![("before_1_21_1".to_string(), false), ("from_1_21_1".to_string(), true)]
        );
        assert_eq!(
            flags("1.21.4"),
            vec![("before_1_21_1".to_string(), false), ("from_1_21_1".to_string(), true)]
        );
    }

    #[test]
    fn test_mod_class_name_and_java_folder() {
        assert_eq!(mod_class_name("My Cool Mod!"), "MyCoolMod");
        assert_eq!(mod_class_name("mod_2-go"), "mod2go");
        assert_eq!(
            settings("1.21.4").java_folder(),
            "src/main/java/com/example/mycoolmod"
        );
    }

    #[test]
    fn test_generator_context() {
        let generator = Generator::new(settings("1.21.4")).unwrap();
        let ctx = generator.context();
        assert_eq!(ctx.get_var("mod_class_name"), Some("MyCoolMod"));
        assert_eq!(ctx.get_var("package_name"), Some("com.example.mycoolmod"));
        assert_eq!(ctx.get_var("minecraft_version"), Some("1.21.4"));
        assert_eq!(ctx.get_flag("from_1_21_1"), Some(true));
        assert_eq!(ctx.get_flag("before_1_21_1"), Some(false));
    }

    #[test]
    fn test_generate_special_new_layout() {
        let files = Generator::new(settings("1.21.4"))
            .unwrap()
            .generate_special()
            .unwrap();
        assert_eq!(files.len(), 1);
        let client = &files["src/main/java/com/example/mycoolmod/MyCoolModClient.java"];
        assert!(client.starts_with("package com.example.mycoolmod;\n"));
        assert!(client.contains("@Mod(value = MyCoolMod.MODID, dist = Dist.CLIENT)"));
        assert!(client.contains("public MyCoolModClient(ModContainer container) {"));
    }

    #[test]
    fn test_generate_special_old_layout() {
        let files = Generator::new(settings("1.20.6"))
            .unwrap()
            .generate_special()
            .unwrap();
        assert_eq!(files.len(), 1);
        let events = &files["src/main/java/com/example/mycoolmod/ClientModEvents.java.fragment"];
        assert!(events.contains("bus = EventBusSubscriber.Bus.MOD"));
        assert!(!events.contains("@EventBusSubscriber(modid = MODID, value = Dist.CLIENT)"));
        assert!(!events.contains("{{"));
    }

    #[test]
    fn test_profile_selects_variant() {
        let generator = Generator::new(settings("1.21.1")).unwrap().with_profile("mdk");
        let out = generator.render("special.ModClassClient").unwrap();
        assert!(out.contains("public class ExampleModClient {"));

        // no mdk variant exists, so the default one is used
        let out = generator.render("special.ClientModEvents").unwrap();
        assert!(out.contains("@EventBusSubscriber(modid = MODID, value = Dist.CLIENT)"));
    }

    #[test]
    fn test_rejects_old_and_invalid_versions() {
        assert!(matches!(
            Generator::new(settings("1.20.1")),
            Err(TemplateError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            Generator::new(settings("latest")),
            Err(TemplateError::UnsupportedVersion(_))
        ));
        assert!(Generator::new(settings("1.20.2")).is_ok());
    }

    fn inputs(raw: &[(&str, &str)], interpolated: &[(&str, &str)]) -> TemplateInputs {
        let map = |files: &[(&str, &str)]| {
            files
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };
        TemplateInputs {
            raw: map(raw),
            interpolated: map(interpolated),
        }
    }

    #[test]
    fn test_generate_template_strips_folder_markers() {
        let inputs = inputs(
            &[
                ("assets/template/raw/gradlew", "#!/bin/sh\n{{ not_rendered }}"),
                ("raw/gradle/raw/wrapper.properties", "x=1"),
            ],
            &[("assets/template/interpolated/gradle.properties", "mod_id={{ mod_id }}\n")],
        );
        let files = Generator::new(settings("1.21.4"))
            .unwrap()
            .generate_template(&inputs)
            .unwrap();

        assert_eq!(files["gradlew"], "#!/bin/sh\n{{ not_rendered }}");
        // only the first marker is stripped
        assert_eq!(files["gradle/raw/wrapper.properties"], "x=1");
        assert_eq!(files["gradle.properties"], "mod_id=mycoolmod\n");
        assert!(files.contains_key("src/main/java/com/example/mycoolmod/MyCoolModClient.java"));
        assert_eq!(files.len(), 4);
    }

    #[test]
    fn test_generate_template_missing_marker() {
        let generator = Generator::new(settings("1.21.4")).unwrap();

        let err = generator
            .generate_template(&inputs(&[("gradlew", "")], &[]))
            .unwrap_err();
        assert_eq!(err.to_string(), "Load error: Missing raw/ in gradlew");

        let err = generator
            .generate_template(&inputs(&[], &[("raw/build.gradle", "")]))
            .unwrap_err();
        assert!(err.to_string().contains("Missing interpolated/ in raw/build.gradle"));
    }

    #[test]
    fn test_generate_template_interpolates_caller_vars() {
        let template = "neo_version={{ neo_version }}\nmod_group_id={{ mod_group_id }}\n\
                        {{ #before_1_21_1 }}legacy=true\n{{ /before_1_21_1 }}";
        let inputs = inputs(&[], &[("interpolated/gradle.properties", template)]);

        let files = Generator::new(settings("1.20.6"))
            .unwrap()
            .with_var("neo_version", "20.6.119")
            .generate_template(&inputs)
            .unwrap();
        assert_eq!(
            files["gradle.properties"],
            "neo_version=20.6.119\nmod_group_id=com.example.mycoolmod\nlegacy=true\n"
        );

        // without the caller-supplied version the render fails as a whole
        let err = Generator::new(settings("1.20.6"))
            .unwrap()
            .generate_template(&inputs)
            .unwrap_err();
        assert!(matches!(
            err,
            TemplateError::Render(crate::RenderError::UnboundVariable(ref v)) if v == "neo_version"
        ));
    }

    #[test]
    fn test_rejects_unusable_mod_name() {
        let mut s = settings("1.21.4");
        s.mod_name = "!!!".into();
        assert!(matches!(Generator::new(s), Err(TemplateError::Context(_))));
    }
}
