/// Where the template manager loads template sets from.
pub struct TemplateOptions<'a> {
    pub assets: Option<Vec<&'a [u8]>>, // template sets held in memory
    pub assets_path: Option<&'a str>,  // directory walked for *.xml template sets
    pub bundled: bool,                 // load the templates shipped with the crate
}

impl<'a> Default for TemplateOptions<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> TemplateOptions<'a> {
    pub fn new() -> Self {
        TemplateOptions {
            assets: None,
            assets_path: None,
            bundled: true,
        }
    }

    pub fn assets(mut self, assets: Vec<&'a [u8]>) -> Self {
        self.assets = Some(assets);
        self
    }

    pub fn assets_path(mut self, assets_path: &'a str) -> Self {
        self.assets_path = Some(assets_path);
        self
    }

    pub fn with_bundled(mut self, bundled: bool) -> Self {
        self.bundled = bundled;
        self
    }
}
