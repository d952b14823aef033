use serde::{Deserialize, Serialize};

/// Continents used to group the quiz's progress board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Continent {
    /// North and Central America plus the Caribbean.
    NorthAmerica,
    /// South America.
    SouthAmerica,
    /// Europe.
    Europe,
    /// Africa.
    Africa,
    /// Asia, including the Middle East.
    Asia,
    /// Oceania.
    Oceania,
}

impl Continent {
    /// Every continent in board order.
    pub const ALL: [Continent; 6] = [
        Continent::NorthAmerica,
        Continent::SouthAmerica,
        Continent::Europe,
        Continent::Africa,
        Continent::Asia,
        Continent::Oceania,
    ];

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Continent::NorthAmerica => "North America",
            Continent::SouthAmerica => "South America",
            Continent::Europe => "Europe",
            Continent::Africa => "Africa",
            Continent::Asia => "Asia",
            Continent::Oceania => "Oceania",
        }
    }
}

/// Accepted answers, spelled the way the board displays them.
pub const COUNTRIES: &[(&str, Continent)] = &[
    ("Canada", Continent::NorthAmerica),
    ("USA", Continent::NorthAmerica),
    ("Mexico", Continent::NorthAmerica),
    ("Belize", Continent::NorthAmerica),
    ("Costa Rica", Continent::NorthAmerica),
    ("El Salvador", Continent::NorthAmerica),
    ("Guatemala", Continent::NorthAmerica),
    ("Honduras", Continent::NorthAmerica),
    ("Nicaragua", Continent::NorthAmerica),
    ("Panama", Continent::NorthAmerica),
    ("Antigua and Barbuda", Continent::NorthAmerica),
    ("Bahamas", Continent::NorthAmerica),
    ("Barbados", Continent::NorthAmerica),
    ("Cuba", Continent::NorthAmerica),
    ("Dominica", Continent::NorthAmerica),
    ("Dominican Republic", Continent::NorthAmerica),
    ("Grenada", Continent::NorthAmerica),
    ("Haiti", Continent::NorthAmerica),
    ("Jamaica", Continent::NorthAmerica),
    ("Saint Kitts and Nevis", Continent::NorthAmerica),
    ("Saint Lucia", Continent::NorthAmerica),
    ("Saint Vincent and the Grenadines", Continent::NorthAmerica),
    ("Trinidad and Tobago", Continent::NorthAmerica),
    ("Argentina", Continent::SouthAmerica),
    ("Bolivia", Continent::SouthAmerica),
    ("Brazil", Continent::SouthAmerica),
    ("Chile", Continent::SouthAmerica),
    ("Colombia", Continent::SouthAmerica),
    ("Ecuador", Continent::SouthAmerica),
    ("Guyana", Continent::SouthAmerica),
    ("Paraguay", Continent::SouthAmerica),
    ("Peru", Continent::SouthAmerica),
    ("Suriname", Continent::SouthAmerica),
    ("Uruguay", Continent::SouthAmerica),
    ("Venezuela", Continent::SouthAmerica),
    ("Albania", Continent::Europe),
    ("Andorra", Continent::Europe),
    ("Austria", Continent::Europe),
    ("Belarus", Continent::Europe),
    ("Belgium", Continent::Europe),
    ("Bosnia and Herzegovina", Continent::Europe),
    ("Bulgaria", Continent::Europe),
    ("Croatia", Continent::Europe),
    ("Cyprus", Continent::Europe),
    ("Czechia", Continent::Europe),
    ("Denmark", Continent::Europe),
    ("Estonia", Continent::Europe),
    ("Finland", Continent::Europe),
    ("France", Continent::Europe),
    ("Germany", Continent::Europe),
    ("Greece", Continent::Europe),
    ("Hungary", Continent::Europe),
    ("Iceland", Continent::Europe),
    ("Ireland", Continent::Europe),
    ("Italy", Continent::Europe),
    ("Kosovo", Continent::Europe),
    ("Latvia", Continent::Europe),
    ("Liechtenstein", Continent::Europe),
    ("Lithuania", Continent::Europe),
    ("Luxembourg", Continent::Europe),
    ("Malta", Continent::Europe),
    ("Moldova", Continent::Europe),
    ("Monaco", Continent::Europe),
    ("Montenegro", Continent::Europe),
    ("Netherlands", Continent::Europe),
    ("North Macedonia", Continent::Europe),
    ("Norway", Continent::Europe),
    ("Poland", Continent::Europe),
    ("Portugal", Continent::Europe),
    ("Romania", Continent::Europe),
    ("Russia", Continent::Europe),
    ("San Marino", Continent::Europe),
    ("Serbia", Continent::Europe),
    ("Slovakia", Continent::Europe),
    ("Slovenia", Continent::Europe),
    ("Spain", Continent::Europe),
    ("Sweden", Continent::Europe),
    ("Switzerland", Continent::Europe),
    ("Turkey", Continent::Europe),
    ("Ukraine", Continent::Europe),
    ("United Kingdom", Continent::Europe),
    ("Vatican City", Continent::Europe),
    ("Algeria", Continent::Africa),
    ("Angola", Continent::Africa),
    ("Benin", Continent::Africa),
    ("Botswana", Continent::Africa),
    ("Burkina Faso", Continent::Africa),
    ("Burundi", Continent::Africa),
    ("Cabo Verde", Continent::Africa),
    ("Cameroon", Continent::Africa),
    ("Central African Republic", Continent::Africa),
    ("Chad", Continent::Africa),
    ("Comoros", Continent::Africa),
    ("Congo", Continent::Africa),
    ("Democratic Republic of the Congo", Continent::Africa),
    ("Ivory Coast", Continent::Africa),
    ("Djibouti", Continent::Africa),
    ("Egypt", Continent::Africa),
    ("Equatorial Guinea", Continent::Africa),
    ("Eritrea", Continent::Africa),
    ("Eswatini", Continent::Africa),
    ("Ethiopia", Continent::Africa),
    ("Gabon", Continent::Africa),
    ("Gambia", Continent::Africa),
    ("Ghana", Continent::Africa),
    ("Guinea", Continent::Africa),
    ("Guinea-Bissau", Continent::Africa),
    ("Kenya", Continent::Africa),
    ("Lesotho", Continent::Africa),
    ("Liberia", Continent::Africa),
    ("Libya", Continent::Africa),
    ("Madagascar", Continent::Africa),
    ("Malawi", Continent::Africa),
    ("Mali", Continent::Africa),
    ("Mauritania", Continent::Africa),
    ("Mauritius", Continent::Africa),
    ("Morocco", Continent::Africa),
    ("Mozambique", Continent::Africa),
    ("Namibia", Continent::Africa),
    ("Niger", Continent::Africa),
    ("Nigeria", Continent::Africa),
    ("Rwanda", Continent::Africa),
    ("Republic of Congo", Continent::Africa),
    ("Sao Tome and Principe", Continent::Africa),
    ("Senegal", Continent::Africa),
    ("Seychelles", Continent::Africa),
    ("Sierra Leone", Continent::Africa),
    ("Somalia", Continent::Africa),
    ("South Africa", Continent::Africa),
    ("South Sudan", Continent::Africa),
    ("Sudan", Continent::Africa),
    ("Tanzania", Continent::Africa),
    ("Togo", Continent::Africa),
    ("Tunisia", Continent::Africa),
    ("Uganda", Continent::Africa),
    ("Zambia", Continent::Africa),
    ("Zimbabwe", Continent::Africa),
    ("Afghanistan", Continent::Asia),
    ("Armenia", Continent::Asia),
    ("Azerbaijan", Continent::Asia),
    ("Bahrain", Continent::Asia),
    ("Bangladesh", Continent::Asia),
    ("Bhutan", Continent::Asia),
    ("Brunei", Continent::Asia),
    ("Cambodia", Continent::Asia),
    ("China", Continent::Asia),
    ("Georgia", Continent::Asia),
    ("India", Continent::Asia),
    ("Indonesia", Continent::Asia),
    ("Iran", Continent::Asia),
    ("Iraq", Continent::Asia),
    ("Israel", Continent::Asia),
    ("Japan", Continent::Asia),
    ("Jordan", Continent::Asia),
    ("Kazakhstan", Continent::Asia),
    ("Kuwait", Continent::Asia),
    ("Kyrgyzstan", Continent::Asia),
    ("Laos", Continent::Asia),
    ("Lebanon", Continent::Asia),
    ("Malaysia", Continent::Asia),
    ("Maldives", Continent::Asia),
    ("Mongolia", Continent::Asia),
    ("Myanmar", Continent::Asia),
    ("Nepal", Continent::Asia),
    ("North Korea", Continent::Asia),
    ("Oman", Continent::Asia),
    ("Pakistan", Continent::Asia),
    ("Palestine", Continent::Asia),
    ("Philippines", Continent::Asia),
    ("Qatar", Continent::Asia),
    ("Saudi Arabia", Continent::Asia),
    ("Singapore", Continent::Asia),
    ("South Korea", Continent::Asia),
    ("Sri Lanka", Continent::Asia),
    ("Syria", Continent::Asia),
    ("Taiwan", Continent::Asia),
    ("Tajikistan", Continent::Asia),
    ("Thailand", Continent::Asia),
    ("Timor-Leste", Continent::Asia),
    ("Turkmenistan", Continent::Asia),
    ("UAE", Continent::Asia),
    ("Uzbekistan", Continent::Asia),
    ("Vietnam", Continent::Asia),
    ("Yemen", Continent::Asia),
    ("Australia", Continent::Oceania),
    ("Papua New Guinea", Continent::Oceania),
    ("New Zealand", Continent::Oceania),
    ("Fiji", Continent::Oceania),
    ("Solomon Islands", Continent::Oceania),
    ("Micronesia", Continent::Oceania),
    ("Vanuatu", Continent::Oceania),
    ("Samoa", Continent::Oceania),
    ("Kiribati", Continent::Oceania),
    ("Tonga", Continent::Oceania),
    ("Marshall Islands", Continent::Oceania),
    ("Palau", Continent::Oceania),
    ("Tuvalu", Continent::Oceania),
    ("Nauru", Continent::Oceania),
];

/// Look up a country by name, ignoring case and surrounding whitespace.
pub fn find(name: &str) -> Option<(&'static str, Continent)> {
    let wanted = name.trim();
    COUNTRIES
        .iter()
        .copied()
        .find(|(country, _)| country.eq_ignore_ascii_case(wanted))
}
