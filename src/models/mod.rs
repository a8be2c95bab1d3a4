pub mod template_options;
