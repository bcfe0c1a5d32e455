use rcany::{deep_clone, AnyValue, DeepClone, DynError, Nil, Ref, Render, Trait};

// Example trait: Animal
trait Animal: Send + Sync {
    fn make_sound(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq)]
struct Dog {
    name: String,
    tricks: Ref<Vec<String>>,
}

impl Animal for Dog {
    fn make_sound(&self) -> &str {
        "Woof!"
    }
}

impl DeepClone for Dog {
    fn deep_clone(&self) -> Self {
        Dog {
            name: self.name.deep_clone(),
            tricks: self.tricks.deep_clone(),
        }
    }
}

impl Render for Dog {
    fn render(&self, out: &mut String) {
        out.push_str("Dog(");
        out.push_str(&self.name);
        out.push(' ');
        self.tricks.render(out);
        out.push(')');
    }
}

fn main() -> Result<(), DynError> {
    let rover = Dog {
        name: "Rover".to_string(),
        tricks: Ref::new(vec!["sit".to_string()]),
    };

    // Store the dog in a type-erased value
    let mut value = AnyValue::new(rover.clone());
    println!("Stored: {} ({:?})", value, value.type_name());

    // Copies share the slot
    let alias = value.clone();
    println!("Share count after copy: {}", value.share_count());

    // Type checks guard extraction
    match value.try_extract::<String>() {
        Ok(text) => println!("This shouldn't happen: {}", text),
        Err(e) => println!("Correctly detected mismatch: {}", e),
    }

    if value.type_is::<Dog>() {
        let dog: Dog = value.extract();
        println!("{} says: {}", dog.name, dog.make_sound());
    }

    // A deep copy owns its own tricks
    let trained = deep_clone(&alias.extract::<Dog>());
    trained.tricks.with_mut(|tricks| tricks.push("roll over".to_string()));
    println!("Original: {}", alias);
    println!("Deep copy: {}", trained.to_text());

    // Behind an interface
    let pet = Trait::<dyn Animal>::new(rover, |dog| dog);
    let other = pet.deep_clone();
    println!(
        "Interface copy is independent: {}, says {}",
        other != pet,
        other.get().make_sound()
    );

    // Clearing releases this share only
    value.set_nil(Nil);
    println!("Cleared: {}, alias still holds {}", value, alias);

    Ok(())
}
