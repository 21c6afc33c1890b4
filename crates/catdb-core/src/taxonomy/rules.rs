//! Built-in apparel & accessories taxonomy.
//!
//! Patterns are matched against `" {name} {type} {description} "` in
//! lowercase, so a leading or trailing space anchors a pattern to a word
//! boundary (`" ring "` does not match "earring").

pub(super) const CATEGORY_RULES: &[(&str, &[&str])] = &[
    ("Mini Dresses", &["mini dress", "minidress"]),
    ("Midi Dresses", &["midi dress", "mididress"]),
    ("Maxi Dresses", &["maxi dress", "maxidress"]),
    ("Slip Dresses", &["slip dress"]),
    ("Shirt Dresses", &["shirt dress", "shirtdress"]),
    ("Dresses", &["sundress", "dress", "gown"]),
    ("Mini Skirts", &["mini skirt", "miniskirt"]),
    ("Skirts", &["skirt", "skort"]),
    ("Jeans", &["jeans", "denim"]),
    (
        "Pants",
        &["trousers", "leggings", "joggers", "culottes", "chinos", "pants"],
    ),
    ("Shorts", &["shorts"]),
    (
        "Jumpsuits & Rompers",
        &["jumpsuit", "romper", "playsuit", "overalls"],
    ),
    (
        "Button-Up Shirts",
        &["button-down", "button down", "button-up", "button up", "oxford shirt"],
    ),
    ("T-Shirts", &["tee shirt", "t-shirt", "tshirt", " tee "]),
    (
        "Sweaters",
        &["turtleneck", "cardigan", "pullover", "sweater", "jumper"],
    ),
    (
        "Hoodies & Sweatshirts",
        &["crewneck sweat", "sweatshirt", "hoodie"],
    ),
    (
        "Tops",
        &["bodysuit", "camisole", "tank top", "crop top", "blouse", "corset", " cami ", " top "],
    ),
    (
        "Outerwear",
        &["trench coat", "jacket", "blazer", "puffer", "parka", "gilet", "coat"],
    ),
    (
        "Swimwear",
        &["one-piece swim", "swim short", "swim trunk", "swimwear", "swimsuit", "bikini"],
    ),
    (
        "Activewear",
        &["activewear", "sports bra", "bike short", "workout", "yoga"],
    ),
    (
        "Lingerie & Intimates",
        &["balconette", "underwear", "lingerie", "bralette", "briefs", "thong"],
    ),
    (
        "Sleepwear",
        &["nightgown", "nightdress", "sleep set", "pajama", "pyjama", " robe "],
    ),
    ("Sneakers", &["running shoe", "sneaker", "trainers"]),
    (
        "Boots",
        &["knee-high boot", "chelsea boot", "combat boot", "ankle boot", "bootie", "boots"],
    ),
    (
        "Sandals",
        &["espadrille", "flip-flop", "flip flop", "sandal", "slides"],
    ),
    ("Heels", &["slingback", "stiletto", "heels", "pumps", "mule"]),
    ("Flats", &["ballet flat", "loafer", "flats"]),
    ("Shoes", &["footwear", "shoe"]),
    (
        "Bags",
        &["shoulder bag", "crossbody", "backpack", "handbag", "clutch", "purse", "tote", " bag "],
    ),
    ("Necklaces", &["necklace", "pendant", "choker"]),
    ("Earrings", &["earring", "ear cuff", "hoops", "studs"]),
    ("Rings", &["signet", " rings ", " ring "]),
    (
        "Bracelets",
        &["cuff bracelet", "bracelet", "bangle", "anklet"],
    ),
    ("Jewelry", &["jewellery", "jewelry"]),
    (
        "Hats",
        &["baseball cap", "bucket hat", "beanie", "fedora", " hat ", " cap "],
    ),
    ("Scarves", &["bandana", "scarves", "scarf"]),
    ("Belts", &[" belts ", " belt "]),
    ("Sunglasses", &["sunglasses", "eyewear"]),
];

/// `(category name, taxonomy id, full path)`.
pub(super) const TAXONOMY: &[(&str, &str, &str)] = &[
    ("Activewear", "aa-1-1", "Apparel & Accessories > Clothing > Activewear"),
    (
        "Jumpsuits & Rompers",
        "aa-1-2",
        "Apparel & Accessories > Clothing > Jumpsuits & Rompers",
    ),
    (
        "Lingerie & Intimates",
        "aa-1-3",
        "Apparel & Accessories > Clothing > Lingerie & Intimates",
    ),
    ("Dresses", "aa-1-4", "Apparel & Accessories > Clothing > Dresses"),
    (
        "Mini Dresses",
        "aa-1-4-1",
        "Apparel & Accessories > Clothing > Dresses > Mini Dresses",
    ),
    (
        "Midi Dresses",
        "aa-1-4-2",
        "Apparel & Accessories > Clothing > Dresses > Midi Dresses",
    ),
    (
        "Maxi Dresses",
        "aa-1-4-3",
        "Apparel & Accessories > Clothing > Dresses > Maxi Dresses",
    ),
    (
        "Slip Dresses",
        "aa-1-4-4",
        "Apparel & Accessories > Clothing > Dresses > Slip Dresses",
    ),
    (
        "Shirt Dresses",
        "aa-1-4-5",
        "Apparel & Accessories > Clothing > Dresses > Shirt Dresses",
    ),
    ("Outerwear", "aa-1-5", "Apparel & Accessories > Clothing > Outerwear"),
    ("Pants", "aa-1-6", "Apparel & Accessories > Clothing > Pants"),
    ("Jeans", "aa-1-7", "Apparel & Accessories > Clothing > Jeans"),
    ("Shorts", "aa-1-8", "Apparel & Accessories > Clothing > Shorts"),
    ("Skirts", "aa-1-9", "Apparel & Accessories > Clothing > Skirts"),
    (
        "Mini Skirts",
        "aa-1-9-1",
        "Apparel & Accessories > Clothing > Skirts > Mini Skirts",
    ),
    ("Sleepwear", "aa-1-10", "Apparel & Accessories > Clothing > Sleepwear"),
    ("Swimwear", "aa-1-11", "Apparel & Accessories > Clothing > Swimwear"),
    ("Tops", "aa-1-12", "Apparel & Accessories > Clothing > Tops"),
    (
        "T-Shirts",
        "aa-1-12-1",
        "Apparel & Accessories > Clothing > Tops > T-Shirts",
    ),
    (
        "Button-Up Shirts",
        "aa-1-12-2",
        "Apparel & Accessories > Clothing > Tops > Button-Up Shirts",
    ),
    (
        "Sweaters",
        "aa-1-12-3",
        "Apparel & Accessories > Clothing > Tops > Sweaters",
    ),
    (
        "Hoodies & Sweatshirts",
        "aa-1-12-4",
        "Apparel & Accessories > Clothing > Tops > Hoodies & Sweatshirts",
    ),
    (
        "Hats",
        "aa-2-1",
        "Apparel & Accessories > Clothing Accessories > Hats",
    ),
    (
        "Scarves",
        "aa-2-2",
        "Apparel & Accessories > Clothing Accessories > Scarves",
    ),
    (
        "Belts",
        "aa-2-3",
        "Apparel & Accessories > Clothing Accessories > Belts",
    ),
    (
        "Sunglasses",
        "aa-2-4",
        "Apparel & Accessories > Clothing Accessories > Sunglasses",
    ),
    ("Bags", "aa-5", "Apparel & Accessories > Bags"),
    ("Jewelry", "aa-6", "Apparel & Accessories > Jewelry"),
    ("Necklaces", "aa-6-1", "Apparel & Accessories > Jewelry > Necklaces"),
    ("Earrings", "aa-6-2", "Apparel & Accessories > Jewelry > Earrings"),
    ("Rings", "aa-6-3", "Apparel & Accessories > Jewelry > Rings"),
    ("Bracelets", "aa-6-4", "Apparel & Accessories > Jewelry > Bracelets"),
    ("Shoes", "aa-8", "Apparel & Accessories > Shoes"),
    ("Sneakers", "aa-8-1", "Apparel & Accessories > Shoes > Sneakers"),
    ("Boots", "aa-8-2", "Apparel & Accessories > Shoes > Boots"),
    ("Sandals", "aa-8-3", "Apparel & Accessories > Shoes > Sandals"),
    ("Heels", "aa-8-4", "Apparel & Accessories > Shoes > Heels"),
    ("Flats", "aa-8-5", "Apparel & Accessories > Shoes > Flats"),
];
