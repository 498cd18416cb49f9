//! Load a scene, run one propagation pass and print every world transform

use scenegraph::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: scenegraph <scene.ron|scene.json>");
        std::process::exit(2);
    };

    let scene = Scene::load(&path)?;
    log::info!("Loaded scene '{}' from {}", scene.name, path);

    let mut world = World::new();
    let entities = scene.instantiate(&mut world)?;
    let stats = world.propagate();
    log::info!(
        "Propagated {} transforms across {} roots",
        stats.worlds_updated,
        stats.roots
    );

    for entity in entities {
        let depth = world.ancestors(entity).len();
        let Some(node) = world.node(entity) else {
            continue;
        };
        let t = node.world().translation();
        let visibility = if node.is_visibly_hidden() { " (hidden)" } else { "" };
        println!(
            "{:indent$}{} -> ({:.3}, {:.3}, {:.3}){}",
            "",
            world.label(entity),
            t.x,
            t.y,
            t.z,
            visibility,
            indent = depth * 2
        );
    }

    Ok(())
}
