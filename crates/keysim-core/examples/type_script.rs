use keysim_core::document::Element;
use keysim_core::{parser, Profile, SystemClipboard, Typist};
use std::path::Path;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let script = args.next().unwrap_or_else(|| "script.keys".to_string());
    let profile = match args.next() {
        Some(path) => Profile::load(path)?,
        None => Profile::default(),
    };
    println!("Platform: {:?}", profile.platform);

    let path = Path::new(&script);
    println!("Loading {:?}", path);
    let sequences = parser::load_script(path)?;
    println!("Loaded {} sequence(s).", sequences.len());

    let typist = Typist::new(profile);
    let mut field = Element::text_area("scratch");
    let mut clipboard = SystemClipboard;

    for (i, keys) in sequences.iter().enumerate() {
        match typist.type_keys(&mut field, &mut clipboard, Some(keys)) {
            Ok(report) => println!("  #{}: {} event(s)", i + 1, report.events.len()),
            Err(e) => println!("  #{}: {}", i + 1, e),
        }
    }

    println!("Final value: {:?}", field.value());
    Ok(())
}
