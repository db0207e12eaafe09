use greinir::lexicon::Lexicon;
use greinir::Result;
use std::path::Path;

// A small inspection tool for lexicon binaries: look a form up and print
// its meaning records, plain or as JSON. Parsing itself goes through the
// library API.

fn main() -> Result<()> {
  let args: Vec<_> = std::env::args().collect();
  if args.len() != 4 || !(args[2] == "lookup" || args[2] == "json") {
    Err("Usage: greinir $lexicon [lookup|json] $form")?;
  }
  let (file, json, form) = (&args[1], args[2] == "json", &args[3]);
  let lexicon = Lexicon::load(Path::new(file))
    .map_err(|x| format!("Failed to load lexicon {}: {}", file, x))?;
  let meanings = lexicon.lookup(form);
  if json {
    let text = serde_json::to_string_pretty(&meanings)
      .map_err(|x| format!("Failed to serialize meanings: {}", x))?;
    println!("{}", text);
    return Ok(());
  }
  if meanings.is_empty() {
    println!("{}: not found", form);
    return Ok(());
  }
  for meaning in meanings {
    let features = greinir::grammar::features::describe(meaning.features).join("_");
    let args = match &meaning.args {
      None => String::new(),
      Some(x) => {
        let cases: Vec<_> =
          x.iter().flat_map(|y| greinir::grammar::features::describe(*y)).collect();
        format!(" [{} {}]", x.len(), cases.join(" "))
      }
    };
    println!("{}: {} {} {}{}", form, meaning.lemma, meaning.class.name(), features, args);
  }
  Ok(())
}
