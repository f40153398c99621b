//! End-to-end assembly over a temporary project.
//!
//! Each test writes a small project with the default directory layout, runs
//! the public `Assembler`, and inspects the HTML written to `dest`.

use std::fs;
use std::path::Path;
use stylebook::assemble::{AssembleError, Assembler};
use stylebook::context::AssemblyContext;
use stylebook::hooks::AssemblyHooks;
use stylebook::materials::{Fragment, MaterialsError};
use stylebook::render::RenderError;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn style_guide() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    write(
        root,
        "src/views/layouts/default.html",
        "<html><head>{{> head}}</head><body>{% body %}</body></html>\n",
    );
    write(root, "src/views/layouts/includes/head.html", "<title>{{title}}</title>");

    write(
        root,
        "src/materials/structures/01-page.html",
        "---\norder: 1\ntitle: Home\n---\n<p>{{title}}</p>\n",
    );
    write(
        root,
        "src/materials/structures/02-footer.html",
        "---\norder: 2\n---\n<footer>{{site.name}}</footer>\n",
    );
    write(
        root,
        "src/materials/components/forms/input.html",
        "---\nplaceholder: Email\nnotes: Pair with a *label*.\n---\n<input placeholder=\"{{placeholder}}\">",
    );

    write(
        root,
        "src/views/index.html",
        "---\ntitle: Style Guide\n---\n\
         {{material \"structures.01-page\"}}{{material \"structures.footer\"}}\
         {{#each materials}}[{{@key}}:{{#each items}}{{@key}} {{/each}}]{{/each}}",
    );
    write(
        root,
        "src/views/pages/about.html",
        "---\ntitle: About\n---\n<a href=\"{{baseurl}}/index.html\">{{docs.intro.name}}</a>",
    );

    write(root, "src/data/site.yml", "name: Acme\n");
    write(root, "src/docs/intro.md", "Welcome.\n");

    tmp
}

fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn builds_every_view_into_dest() {
    let tmp = style_guide();
    let mut assembler = Assembler::new(tmp.path()).unwrap();
    assembler.set_dest(tmp.path().join("out"));

    let report = assembler.assemble().unwrap();

    assert_eq!(report.pages.len(), 2);
    assert!(tmp.path().join("out/index.html").is_file());
    assert!(tmp.path().join("out/pages/about.html").is_file());
}

#[test]
fn materials_render_with_their_own_data() {
    let tmp = style_guide();
    let mut assembler = Assembler::new(tmp.path()).unwrap();
    assembler.set_dest(tmp.path().join("out"));
    assembler.assemble().unwrap();

    let index = read(tmp.path().join("out/index.html"));
    assert!(index.starts_with("<html><head><title>Style Guide</title></head><body>"));
    assert!(index.contains("<p>Home</p>"));
    assert!(index.contains("<footer>Acme</footer>"));
    assert!(index.ends_with("</body></html>"));
}

#[test]
fn views_see_the_sorted_materials_tree() {
    let tmp = style_guide();
    let mut assembler = Assembler::new(tmp.path()).unwrap();
    assembler.set_dest(tmp.path().join("out"));
    assembler.assemble().unwrap();

    let index = read(tmp.path().join("out/index.html"));
    assert!(index.contains("[components:forms ][structures:page footer ]"));
}

#[test]
fn collection_views_get_a_relative_baseurl() {
    let tmp = style_guide();
    let mut assembler = Assembler::new(tmp.path()).unwrap();
    assembler.set_dest(tmp.path().join("out"));
    assembler.assemble().unwrap();

    let about = read(tmp.path().join("out/pages/about.html"));
    assert!(about.contains("<a href=\"../index.html\">Intro</a>"));
}

#[test]
fn dest_comes_from_config() {
    let tmp = style_guide();
    write(tmp.path(), "stylebook.toml", "dest = \"public\"\n");

    Assembler::new(tmp.path()).unwrap().assemble().unwrap();

    assert!(tmp.path().join("public/index.html").is_file());
}

#[test]
fn setup_exposes_the_namespaced_partials() {
    let tmp = style_guide();
    let ctx = Assembler::new(tmp.path()).unwrap().setup().unwrap();

    assert_eq!(ctx.partials["structures.page"], "<p>{{structures-page.title}}</p>");
    assert_eq!(
        ctx.partials["forms.input"],
        "<input placeholder=\"{{forms-input.placeholder}}\">"
    );
    assert_eq!(ctx.material_data["forms-input"]["placeholder"], "Email");
}

#[test]
fn duplicate_ids_fail_under_error_policy() {
    let tmp = style_guide();
    write(tmp.path(), "src/materials/structures/03-page.html", "<p>again</p>");
    write(tmp.path(), "stylebook.toml", "[materials]\nduplicate_ids = \"error\"\n");

    let err = Assembler::new(tmp.path()).unwrap().setup().unwrap_err();
    assert!(matches!(
        err,
        AssembleError::Materials(MaterialsError::DuplicateId { .. })
    ));
}

#[test]
fn malformed_front_matter_aborts_before_writing() {
    let tmp = style_guide();
    write(tmp.path(), "src/materials/structures/broken.html", "---\ntitle: [oops\n---\n");
    let mut assembler = Assembler::new(tmp.path()).unwrap();
    assembler.set_dest(tmp.path().join("out"));

    assert!(assembler.assemble().is_err());
    assert!(!tmp.path().join("out").exists());
}

#[test]
fn materials_with_sections_render_through_their_namespace() {
    let tmp = style_guide();
    write(
        tmp.path(),
        "src/materials/lists/menu.html",
        "---\nitems: [a, b]\nlink: {href: /x}\n---\n\
         <ul>{{#items}}<li>{{this}}</li>{{/items}}</ul>{{#link}}<a href=\"{{href}}\"></a>{{/link}}",
    );
    write(tmp.path(), "src/views/menu.html", "{{material \"lists.menu\"}}");
    let mut assembler = Assembler::new(tmp.path()).unwrap();
    assembler.set_dest(tmp.path().join("out"));

    assembler.assemble().unwrap();

    let menu = read(tmp.path().join("out/menu.html"));
    assert!(menu.contains("<ul><li>a</li><li>b</li></ul><a href=\"/x\"></a>"));
}

#[test]
fn view_dest_outside_the_output_directory_is_rejected() {
    let tmp = style_guide();
    write(tmp.path(), "src/views/escape.html", "---\ndest: ../escaped/x\n---\nx");
    let mut assembler = Assembler::new(tmp.path()).unwrap();
    assembler.set_dest(tmp.path().join("out"));

    let err = assembler.assemble().unwrap_err();
    assert!(matches!(err, AssembleError::Render(RenderError::DestOutside { .. })));
    assert!(!tmp.path().join("escaped").exists());
}

struct Stamp;

impl AssemblyHooks for Stamp {
    fn on_material(&self, _ctx: &AssemblyContext, fragment: &Fragment, content: String) -> String {
        format!("<!-- {} -->{}", fragment.id, content)
    }

    fn on_view(&self, _ctx: &AssemblyContext, _view: &Path, html: String) -> String {
        html + "\n<!-- built -->"
    }
}

#[test]
fn hooks_transform_materials_and_pages() {
    let tmp = style_guide();
    let mut assembler = Assembler::new(tmp.path()).unwrap().with_hook(Stamp);
    assembler.set_dest(tmp.path().join("out"));
    assembler.assemble().unwrap();

    let index = read(tmp.path().join("out/index.html"));
    assert!(index.contains("<!-- structures.page --><p>Home</p>"));
    assert!(index.ends_with("<!-- built -->"));
}
