//! Plain-text rendering of decoded owner trees.

use menagerie_core::model::{Owner, Pet};

/// Render owners without their pets.
pub fn render_owner_names(owners: &[Owner]) -> String {
    let mut out = String::new();
    for owner in owners {
        out.push_str(&format!("{}\n", owner.name));
    }
    out
}

/// Render owners with their full pet trees.
pub fn render_owners(owners: &[Owner]) -> String {
    let mut out = String::new();
    for owner in owners {
        out.push_str(&format!("{} ({} pets)\n", owner.name, owner.pets.len()));
        for pet in &owner.pets {
            out.push_str(&render_pet(pet));
        }
    }
    out
}

fn render_pet(pet: &Pet) -> String {
    match pet {
        Pet::Feline(f) => {
            let mut line = format!(
                "  {} (feline, prefers boxes: {})",
                f.name, f.prefers_boxes
            );
            if let Some(tolerated) = &f.tolerates {
                line.push_str(&format!(", tolerates {}", tolerated.name));
            }
            line.push('\n');
            line
        }
        Pet::Canine(c) => {
            let mut line = format!("  {} (canine", c.name);
            match &c.favorite_toy {
                Some(toy) => line.push_str(&format!(", favorite toy: {}", toy.name)),
                None => line.push_str(", no favorite toy"),
            }
            if let Some(friend) = &c.friends_with {
                line.push_str(&format!(", friends with {}", friend.name));
            }
            line.push_str(")\n");
            line
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use menagerie_core::model::{Canine, Feline, Toy};

    #[test]
    fn test_render_owner_tree() {
        let owners = vec![Owner {
            id: [1; 16],
            name: "Dominic".into(),
            pets: vec![Pet::Canine(Canine {
                id: [2; 16],
                name: "Hati".into(),
                favorite_toy: Some(Toy {
                    id: [3; 16],
                    name: "Squeeky duck".into(),
                }),
                friends_with: None,
            })],
        }];

        let out = render_owners(&owners);
        assert!(out.contains("Dominic (1 pets)"));
        assert!(out.contains("favorite toy: Squeeky duck"));
    }

    #[test]
    fn test_render_feline_line() {
        let owners = vec![Owner {
            id: [1; 16],
            name: "Janice".into(),
            pets: vec![Pet::Feline(Feline {
                id: [2; 16],
                name: "Kibbles".into(),
                prefers_boxes: false,
                tolerates: None,
            })],
        }];

        let out = render_owners(&owners);
        assert!(out.contains("Kibbles (feline, prefers boxes: false)"));
    }
}
