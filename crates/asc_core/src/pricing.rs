//! Static storefront reference data. Campaign creation must cover every
//! supported storefront, each echoing the campaign's price tier.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorefrontCountry {
    /// ISO 3166-1 alpha-2 storefront code.
    pub code: &'static str,
    pub currency: &'static str,
}

const COUNTRIES: &[StorefrontCountry] = &[
    StorefrontCountry { code: "AE", currency: "AED" },
    StorefrontCountry { code: "AR", currency: "ARS" },
    StorefrontCountry { code: "AT", currency: "EUR" },
    StorefrontCountry { code: "AU", currency: "AUD" },
    StorefrontCountry { code: "BE", currency: "EUR" },
    StorefrontCountry { code: "BG", currency: "BGN" },
    StorefrontCountry { code: "BR", currency: "BRL" },
    StorefrontCountry { code: "CA", currency: "CAD" },
    StorefrontCountry { code: "CH", currency: "CHF" },
    StorefrontCountry { code: "CL", currency: "CLP" },
    StorefrontCountry { code: "CN", currency: "CNY" },
    StorefrontCountry { code: "CO", currency: "COP" },
    StorefrontCountry { code: "CZ", currency: "CZK" },
    StorefrontCountry { code: "DE", currency: "EUR" },
    StorefrontCountry { code: "DK", currency: "DKK" },
    StorefrontCountry { code: "EG", currency: "EGP" },
    StorefrontCountry { code: "ES", currency: "EUR" },
    StorefrontCountry { code: "FI", currency: "EUR" },
    StorefrontCountry { code: "FR", currency: "EUR" },
    StorefrontCountry { code: "GB", currency: "GBP" },
    StorefrontCountry { code: "GR", currency: "EUR" },
    StorefrontCountry { code: "HK", currency: "HKD" },
    StorefrontCountry { code: "HR", currency: "EUR" },
    StorefrontCountry { code: "HU", currency: "HUF" },
    StorefrontCountry { code: "ID", currency: "IDR" },
    StorefrontCountry { code: "IE", currency: "EUR" },
    StorefrontCountry { code: "IL", currency: "ILS" },
    StorefrontCountry { code: "IN", currency: "INR" },
    StorefrontCountry { code: "IT", currency: "EUR" },
    StorefrontCountry { code: "JP", currency: "JPY" },
    StorefrontCountry { code: "KR", currency: "KRW" },
    StorefrontCountry { code: "MX", currency: "MXN" },
    StorefrontCountry { code: "MY", currency: "MYR" },
    StorefrontCountry { code: "NG", currency: "NGN" },
    StorefrontCountry { code: "NL", currency: "EUR" },
    StorefrontCountry { code: "NO", currency: "NOK" },
    StorefrontCountry { code: "NZ", currency: "NZD" },
    StorefrontCountry { code: "PE", currency: "PEN" },
    StorefrontCountry { code: "PH", currency: "PHP" },
    StorefrontCountry { code: "PL", currency: "PLN" },
    StorefrontCountry { code: "PT", currency: "EUR" },
    StorefrontCountry { code: "RO", currency: "RON" },
    StorefrontCountry { code: "RU", currency: "RUB" },
    StorefrontCountry { code: "SA", currency: "SAR" },
    StorefrontCountry { code: "SE", currency: "SEK" },
    StorefrontCountry { code: "SG", currency: "SGD" },
    StorefrontCountry { code: "TH", currency: "THB" },
    StorefrontCountry { code: "TR", currency: "TRY" },
    StorefrontCountry { code: "TW", currency: "TWD" },
    StorefrontCountry { code: "US", currency: "USD" },
    StorefrontCountry { code: "VN", currency: "VND" },
    StorefrontCountry { code: "ZA", currency: "ZAR" },
];

pub fn storefront_countries() -> &'static [StorefrontCountry] {
    COUNTRIES
}
