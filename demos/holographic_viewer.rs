//! # Holographic Viewer
//!
//! Loads a few OBJ models into the fixed scene and lets the control panel
//! switch them between the holographic shader and the matcap materials.
//! Models stream in on background threads; toggle visibility before a model
//! finishes loading and it appears in the chosen state.

use holoscene::Placement;

fn main() -> anyhow::Result<()> {
    let mut app = holoscene::default();

    // Showpiece in the middle, slowly swaying.
    app.add_model(
        "assets/batmobile.obj",
        Placement::new().at(0.0, 0.0, 0.0).spinning(0.3, 0.0),
    );

    // The diorama ships with its own floor plane; keep it baked so the
    // holographic effect only covers the vehicle shell.
    app.add_model_with_exclusion(
        "assets/diorama.obj",
        Placement::new().at(-4.0, 0.0, -2.0).scaled(0.8),
        |node| node.contains("Floor"),
    );

    app.add_model(
        "assets/drone.obj",
        Placement::new().at(3.5, 1.2, -1.5).scaled(0.5).spinning(0.7, 1.3),
    );

    app.run();
    Ok(())
}
