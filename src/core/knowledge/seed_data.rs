// Built-in Namibia corpus, used when the CSV feed can't be reached and the
// store is still empty.

use super::knowledge_models::NewKnowledgeEntry;

const FALLBACK: &[(&str, &str, &str, &str)] = &[
    // Geography
    (
        "Geography",
        "Where is Namibia",
        "Namibia is in southwestern Africa, bordered by Angola, Zambia, Botswana, South Africa, and the Atlantic Ocean.",
        "location, africa, southern africa, borders",
    ),
    (
        "Geography",
        "Capital of Namibia",
        "The capital of Namibia is Windhoek, located in the central highlands.",
        "windhoek, capital, city",
    ),
    (
        "Geography",
        "Size of Namibia",
        "Namibia covers about 825,615 square kilometers, making it the 34th largest country.",
        "size, area, square kilometers",
    ),
    // Tourism
    (
        "Tourism",
        "Best time to visit Namibia",
        "The best time is May to October (dry season) for wildlife viewing and comfortable temperatures.",
        "visit, travel, season, weather",
    ),
    (
        "Tourism",
        "Etosha National Park",
        "Etosha is Namibia's premier wildlife destination with lions, elephants, rhinos, and over 100 mammal species.",
        "etosha, safari, wildlife, park",
    ),
    (
        "Tourism",
        "Sossusvlei",
        "Sossusvlei features the world's highest sand dunes (up to 380m) in the Namib Desert.",
        "sossusvlei, dunes, desert, sand",
    ),
    // Culture
    (
        "Culture",
        "Himba People",
        "The Himba are semi-nomadic pastoralists known for their red ochre body paint and traditional lifestyle.",
        "himba, tribe, people, culture",
    ),
    (
        "Culture",
        "Languages in Namibia",
        "English is official, but Afrikaans, German, Oshiwambo, and other indigenous languages are spoken.",
        "language, english, afrikaans, oshiwambo",
    ),
    // Practical
    (
        "Practical",
        "Currency",
        "Namibia uses the Namibian Dollar (NAD), which is pegged to the South African Rand.",
        "money, currency, dollar, nad",
    ),
    // Wildlife
    (
        "Wildlife",
        "Desert Adapted Elephants",
        "These elephants have longer legs and larger feet to walk on sand, and can survive without water for days.",
        "elephant, desert, adapted, wildlife",
    ),
    // Facts
    (
        "Facts",
        "Oldest Desert",
        "The Namib Desert is 55-80 million years old, making it the world's oldest desert.",
        "desert, oldest, namib, record",
    ),
];

pub fn fallback_entries() -> Vec<NewKnowledgeEntry> {
    FALLBACK
        .iter()
        .map(|(category, topic, content, keywords)| {
            NewKnowledgeEntry::from_fields(topic, content, category, keywords)
        })
        .collect()
}
