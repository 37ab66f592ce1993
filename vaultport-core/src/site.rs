//! Generated-site scaffolding: site configuration, module manifests, the
//! deploy workflow, and the static-asset placeholder.

use crate::config::ConvertConfig;
use crate::slug::slugify;

/// Hugo release pinned in the generated deploy workflow.
pub const HUGO_VERSION: &str = "0.155.3";

/// Fixed archive paths for the files that are always regenerated and never
/// preserved from an uploaded site.
pub const SITE_CONFIG_PATH: &str = "hugo.toml";
pub const GO_MOD_PATH: &str = "go.mod";
pub const GO_SUM_PATH: &str = "go.sum";
pub const WORKFLOW_PATH: &str = ".github/workflows/hugo.yml";
pub const IMAGES_README_PATH: &str = "static/images/README.md";

fn escape_toml(s: &str) -> String {
    s.replace('"', "\\\"")
}

fn username_or_default(config: &ConvertConfig) -> &str {
    if config.github_username.trim().is_empty() {
        "username"
    } else {
        &config.github_username
    }
}

fn repo_or_default(config: &ConvertConfig) -> &str {
    if config.repo_name.trim().is_empty() {
        "my-blog"
    } else {
        &config.repo_name
    }
}

fn site_name_or_default(config: &ConvertConfig) -> &str {
    if config.site_name.trim().is_empty() {
        "My Blog"
    } else {
        &config.site_name
    }
}

/// Wrapping folder name for the emitted archive.
pub fn site_archive_root(config: &ConvertConfig) -> String {
    format!("{}-hugo-site", slugify(site_name_or_default(config)))
}

/// The generated site configuration (PaperMod theme, math passthrough).
pub fn hugo_config(config: &ConvertConfig) -> String {
    let username = username_or_default(config);
    let repo = repo_or_default(config);
    let title = escape_toml(site_name_or_default(config));
    let description = escape_toml(&config.description);
    let author = escape_toml(&config.author);
    let home_content = if config.description.is_empty() {
        "Welcome to my blog".to_string()
    } else {
        escape_toml(&config.description)
    };

    format!(
        r#"baseURL = "https://{username}.github.io/{repo}/"
languageCode = "en-us"
title = "{title}"
# theme is imported via [module] below, do not set theme here

[pagination]
  pagerSize = 10

[params]
  env = "production"
  description = "{description}"
  author = "{author}"
  defaultTheme = "auto"
  ShowReadingTime = true
  ShowShareButtons = false
  ShowPostNavLinks = true
  ShowBreadCrumbs = true
  ShowCodeCopyButtons = true
  ShowToc = true
  math = true
  mathjax = true

[params.homeInfoParams]
  Title = "{title}"
  Content = "{home_content}"

[markup]
  [markup.goldmark]
    [markup.goldmark.renderer]
      unsafe = true
    [markup.goldmark.extensions]
      [markup.goldmark.extensions.passthrough]
        enable = true
        [markup.goldmark.extensions.passthrough.delimiters]
          block = [["$$", "$$"]]
          inline = [["$", "$"]]

[module]
  [[module.imports]]
    path = "github.com/adityatelange/hugo-PaperMod"
"#
    )
}

/// The generated Go module manifest importing the theme module.
pub fn go_mod(config: &ConvertConfig) -> String {
    format!(
        "module github.com/{}/{}\n\ngo 1.23\n",
        username_or_default(config),
        repo_or_default(config)
    )
}

/// go.sum starts empty; the deploy workflow populates it.
pub const GO_SUM: &str = "";

/// GitHub Pages deploy workflow, pinned to [`HUGO_VERSION`].
pub fn deploy_workflow() -> String {
    format!(
        r#"name: Deploy Hugo site to GitHub Pages

on:
  push:
    branches: ["main"]
  workflow_dispatch:

permissions:
  contents: read
  pages: write
  id-token: write

concurrency:
  group: "pages"
  cancel-in-progress: false

defaults:
  run:
    shell: bash

jobs:
  build:
    runs-on: ubuntu-latest
    env:
      HUGO_VERSION: "{HUGO_VERSION}"
    steps:
      - name: Install Hugo CLI
        run: |
          wget -O ${{{{ runner.temp }}}}/hugo.deb https://github.com/gohugoio/hugo/releases/download/v${{HUGO_VERSION}}/hugo_extended_${{HUGO_VERSION}}_linux-amd64.deb
          sudo dpkg -i ${{{{ runner.temp }}}}/hugo.deb

      - name: Install Go
        uses: actions/setup-go@v5
        with:
          go-version: '1.23'

      - name: Checkout
        uses: actions/checkout@v4

      - name: Setup Pages
        id: pages
        uses: actions/configure-pages@v5

      - name: Install Hugo Modules
        run: hugo mod get

      - name: Build with Hugo
        env:
          HUGO_CACHEDIR: ${{{{ runner.temp }}}}/hugo_cache
          HUGO_ENVIRONMENT: production
        run: |
          hugo --minify --baseURL "${{{{ steps.pages.outputs.base_url }}}}/"

      - name: Upload artifact
        uses: actions/upload-pages-artifact@v3
        with:
          path: ./public

  deploy:
    environment:
      name: github-pages
      url: ${{{{ steps.deployment.outputs.page_url }}}}
    runs-on: ubuntu-latest
    needs: build
    steps:
      - name: Deploy to GitHub Pages
        id: deployment
        uses: actions/deploy-pages@v4
"#
    )
}

/// Placeholder dropped into static/images/ explaining where referenced
/// images go.
pub const IMAGES_README: &str = r#"# Images Folder

Place your blog images in this folder.

When your notes reference images like `![[my-image.png]]`,
they are converted to standard markdown: `![](my-image.png)`.

To make them work in Hugo:
1. Copy the referenced images from your vault into this folder
2. Hugo will serve them from /images/ path

Example:
- Markdown reference: `![](my-image.png)`
- File location: `static/images/my-image.png`
- Rendered URL: `/images/my-image.png`
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hugo_config_contains_settings() {
        let config = ConvertConfig {
            site_name: "Field Notes".into(),
            github_username: "someone".into(),
            repo_name: "notes".into(),
            ..Default::default()
        };
        let toml = hugo_config(&config);
        assert!(toml.contains("baseURL = \"https://someone.github.io/notes/\""));
        assert!(toml.contains("title = \"Field Notes\""));
        assert!(toml.contains("hugo-PaperMod"));
    }

    #[test]
    fn test_hugo_config_escapes_quotes() {
        let config = ConvertConfig {
            site_name: "Say \"Hi\"".into(),
            ..Default::default()
        };
        let toml = hugo_config(&config);
        assert!(toml.contains("title = \"Say \\\"Hi\\\"\""));
    }

    #[test]
    fn test_defaults_substituted_when_empty() {
        let config = ConvertConfig {
            github_username: String::new(),
            ..Default::default()
        };
        assert!(go_mod(&config).starts_with("module github.com/username/my-blog"));
    }

    #[test]
    fn test_site_archive_root() {
        let config = ConvertConfig {
            site_name: "Field Notes".into(),
            ..Default::default()
        };
        assert_eq!(site_archive_root(&config), "field-notes-hugo-site");
    }

    #[test]
    fn test_workflow_pins_hugo_version() {
        let workflow = deploy_workflow();
        assert!(workflow.contains("HUGO_VERSION: \"0.155.3\""));
        assert!(workflow.contains("actions/deploy-pages@v4"));
    }
}
